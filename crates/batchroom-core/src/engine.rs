//! Image transform engine: one source image in, one encoded output out.
//!
//! # Pipeline
//!
//! 1. Read and decode the source bytes
//! 2. Resolve output dimensions ([`crate::geometry::resolve`])
//! 3. Resample into a floating-point surface of the output size
//! 4. Run the tone pipeline ([`crate::tone`]) on that same surface
//! 5. Quantize to 8-bit once and encode
//!
//! Resampling and tone ops share one float surface, so there is no rounding
//! between them. Every buffer lives on this call's stack frame and is
//! dropped on every return path.
//!
//! Before any float surface is allocated its size is checked against the
//! `image` crate's default allocation limit; an oversized output is an
//! encode failure for that image, not an allocation abort.
//!
//! Any error is turned into a [`TransformFailure`] here; nothing escapes
//! the per-image boundary.

use image::{imageops, DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::archive::{validate_entry_name, ArchiveError};
use crate::decode::{decode_image, DecodeError, ResampleFilter};
use crate::encode::{encode, EncodeError};
use crate::geometry;
use crate::source::SourceImage;
use crate::spec::{OutputFormat, TransformSpec};
use crate::tone::{apply_tone_ops, compose, ToneOp};

/// Bytes per pixel of the `Rgba32F` working surface.
const FLOAT_PIXEL_BYTES: u64 = 16;

/// Engine settings that stay fixed across batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Kernel used when output and source sizes differ.
    pub resample: ResampleFilter,
}

/// A successfully transformed image.
#[derive(Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// Archive entry name, `<display_name>.<ext>`.
    pub name: String,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl std::fmt::Debug for TransformOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformOutput")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish()
    }
}

/// Why an image failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// The bytes could not be retrieved or decoded.
    Decode,
    /// The transformed surface could not be encoded.
    Encode,
}

/// A failed image, recorded instead of aborting the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformFailure {
    pub source_id: String,
    pub reason: ErrorKind,
    /// Human-readable detail for the caller to show.
    pub message: String,
}

/// Outcome of transforming one source image.
pub type TransformResult = Result<TransformOutput, TransformFailure>;

/// Internal error type for a single transform.
#[derive(Debug, Error)]
enum TransformError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    OutputName(#[from] ArchiveError),
}

impl TransformError {
    fn kind(&self) -> ErrorKind {
        match self {
            TransformError::Decode(_) => ErrorKind::Decode,
            TransformError::Encode(_) | TransformError::OutputName(_) => ErrorKind::Encode,
        }
    }

    fn into_failure(self, source_id: &str) -> TransformFailure {
        TransformFailure {
            source_id: source_id.to_string(),
            reason: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Applies a [`TransformSpec`] to one image at a time.
#[derive(Debug, Clone, Default)]
pub struct ImageTransformEngine {
    config: EngineConfig,
}

impl ImageTransformEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decode, resize, tone and encode one source image.
    ///
    /// Never panics on bad input; failures come back as `Err(TransformFailure)`.
    #[tracing::instrument(level = "debug", skip_all, fields(source_id = %source.id))]
    pub fn transform(&self, source: &SourceImage, spec: &TransformSpec) -> TransformResult {
        self.try_transform(source, spec).map_err(|err| {
            warn!(source_id = %source.id, "Image transform failed: {err}");
            err.into_failure(&source.id)
        })
    }

    fn try_transform(
        &self,
        source: &SourceImage,
        spec: &TransformSpec,
    ) -> Result<TransformOutput, TransformError> {
        let name = output_name(&source.display_name, spec.output_format);
        validate_entry_name(&name)?;

        let decoded = {
            let bytes = source.read_bytes().map_err(DecodeError::from)?;
            decode_image(&bytes)?
        };

        let (src_width, src_height) = decoded.dimensions();
        let (width, height) = geometry::resolve(src_width, src_height, &spec.resize);
        let ops = compose(&spec.tone);
        debug!(
            src_width,
            src_height,
            width,
            height,
            ops = ops.len(),
            quality = ?spec.encoder_quality(),
            "Rendering"
        );

        check_surface_budget((src_width, src_height), (width, height), !ops.is_empty())?;
        let surface = render(decoded, width, height, &ops, self.config.resample);
        let bytes = encode(&surface, spec.output_format, spec.quality)?;

        Ok(TransformOutput {
            name,
            bytes,
            width,
            height,
            format: spec.output_format,
        })
    }
}

/// Reject outputs whose float surface would exceed the allocation limit.
///
/// Nothing is allocated when the source passes through unchanged. The
/// float copy of the source is already bounded by the decoder's limits.
fn check_surface_budget(
    source: (u32, u32),
    output: (u32, u32),
    has_ops: bool,
) -> Result<(), EncodeError> {
    if source == output && !has_ops {
        return Ok(());
    }

    let (width, height) = output;
    let limit = image::Limits::default().max_alloc.unwrap_or(u64::MAX);
    let bytes = (width as u64)
        .checked_mul(height as u64)
        .and_then(|pixels| pixels.checked_mul(FLOAT_PIXEL_BYTES));

    match bytes {
        Some(bytes) if bytes <= limit => Ok(()),
        _ => Err(EncodeError::SurfaceTooLarge {
            width,
            height,
            limit,
        }),
    }
}

/// Draw `source` into a `width x height` surface with `ops` applied.
///
/// When no resampling and no ops are needed the source is returned as-is.
pub fn render(
    source: RgbaImage,
    width: u32,
    height: u32,
    ops: &[ToneOp],
    filter: ResampleFilter,
) -> RgbaImage {
    let same_size = source.dimensions() == (width, height);
    if same_size && ops.is_empty() {
        return source;
    }

    let mut surface = DynamicImage::ImageRgba8(source).into_rgba32f();
    if !same_size {
        surface = imageops::resize(&surface, width, height, filter.to_image_filter());
    }
    apply_tone_ops(&mut surface, ops);

    DynamicImage::ImageRgba32F(surface).into_rgba8()
}

/// Archive entry name for an output.
pub fn output_name(display_name: &str, format: OutputFormat) -> String {
    format!("{}.{}", display_name, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_png;
    use crate::spec::{ResizeSpec, ToneSpec};
    use image::Rgba;

    fn png_source(id: &str, name: &str, width: u32, height: u32) -> SourceImage {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        });
        let bytes = encode_png(img.as_raw(), width, height).unwrap();
        SourceImage::from_bytes(id, name, bytes)
    }

    fn spec(resize: ResizeSpec, tone: ToneSpec, format: OutputFormat) -> TransformSpec {
        TransformSpec::new(resize, tone, format, 90).unwrap()
    }

    #[test]
    fn test_transform_landscape_resize() {
        let engine = ImageTransformEngine::default();
        let source = png_source("s1", "beach", 192, 108);
        let spec = spec(ResizeSpec::to(64, 64, true), ToneSpec::new(), OutputFormat::Jpeg);

        let out = engine.transform(&source, &spec).unwrap();
        assert_eq!(out.name, "beach.jpeg");
        assert_eq!((out.width, out.height), (64, 36));
        assert_eq!(out.format, OutputFormat::Jpeg);

        let decoded = decode_image(&out.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 36));
    }

    #[test]
    fn test_transform_portrait_resize() {
        let engine = ImageTransformEngine::default();
        let source = png_source("s2", "tower", 80, 120);
        let spec = spec(ResizeSpec::to(64, 64, true), ToneSpec::new(), OutputFormat::Png);

        let out = engine.transform(&source, &spec).unwrap();
        // 64 * 80 / 120 = 42.67
        assert_eq!((out.width, out.height), (43, 64));
        assert_eq!(out.name, "tower.png");
    }

    #[test]
    fn test_png_without_changes_is_pixel_exact() {
        let engine = ImageTransformEngine::default();
        let source = png_source("s", "exact", 17, 9);
        let original = decode_image(&source.read_bytes().unwrap()).unwrap();

        let out = engine
            .transform(&source, &TransformSpec { output_format: OutputFormat::Png, ..TransformSpec::default() })
            .unwrap();
        assert_eq!(decode_image(&out.bytes).unwrap(), original);
    }

    #[test]
    fn test_neutral_tone_matches_no_filter() {
        let original = decode_image(&png_source("s", "n", 30, 20).read_bytes().unwrap()).unwrap();

        let no_ops = render(original.clone(), 12, 8, &[], ResampleFilter::Bilinear);
        let neutral = render(
            original,
            12,
            8,
            &compose(&ToneSpec::new()),
            ResampleFilter::Bilinear,
        );
        assert_eq!(no_ops, neutral);
    }

    #[test]
    fn test_render_applies_tone_at_output_size() {
        let source = RgbaImage::from_pixel(10, 10, Rgba([100, 100, 100, 255]));
        let out = render(
            source,
            5,
            5,
            &[ToneOp::Brightness { amount: 0.2 }],
            ResampleFilter::Lanczos3,
        );
        assert_eq!(out.dimensions(), (5, 5));
        assert_eq!(out.get_pixel(2, 2).0, [151, 151, 151, 255]);
    }

    #[test]
    fn test_decode_failure_is_recorded() {
        let engine = ImageTransformEngine::default();
        let source = SourceImage::from_bytes("bad-1", "broken", b"definitely not an image".to_vec());

        let failure = engine.transform(&source, &TransformSpec::default()).unwrap_err();
        assert_eq!(failure.source_id, "bad-1");
        assert_eq!(failure.reason, ErrorKind::Decode);
        assert_eq!(failure.message, "Invalid or unsupported image format");
    }

    #[test]
    fn test_fetch_failure_is_a_decode_failure() {
        struct Offline;
        impl crate::source::ByteSource for Offline {
            fn read_bytes(&self) -> Result<std::borrow::Cow<'_, [u8]>, crate::source::FetchError> {
                Err(crate::source::FetchError::new("offline"))
            }
        }

        let engine = ImageTransformEngine::default();
        let source = SourceImage::new("f-1", "remote", Offline);
        let failure = engine.transform(&source, &TransformSpec::default()).unwrap_err();
        assert_eq!(failure.reason, ErrorKind::Decode);
        assert!(failure.message.contains("offline"));
    }

    #[test]
    fn test_encode_failure_is_recorded() {
        let engine = ImageTransformEngine::default();
        // Wider than WebP can store; cheap because it is one row tall
        let source = png_source("wide", "panorama", 20_000, 1);
        let spec = spec(ResizeSpec::default(), ToneSpec::new(), OutputFormat::Webp);

        let failure = engine.transform(&source, &spec).unwrap_err();
        assert_eq!(failure.source_id, "wide");
        assert_eq!(failure.reason, ErrorKind::Encode);
    }

    #[test]
    fn test_oversized_output_is_an_encode_failure() {
        let engine = ImageTransformEngine::default();
        let source = png_source("tiny", "strip", 2, 1);
        // 20000 x 10000 at 16 bytes per pixel is 3.2 GB
        let spec = spec(ResizeSpec::to(20_000, 20_000, true), ToneSpec::new(), OutputFormat::Jpeg);

        let failure = engine.transform(&source, &spec).unwrap_err();
        assert_eq!(failure.source_id, "tiny");
        assert_eq!(failure.reason, ErrorKind::Encode);
        assert!(failure.message.contains("20000x10000"), "{}", failure.message);
    }

    #[test]
    fn test_extreme_targets_do_not_overflow() {
        let engine = ImageTransformEngine::default();
        let source = png_source("x", "huge", 3, 3);
        let spec = spec(ResizeSpec::to(u32::MAX, u32::MAX, false), ToneSpec::new(), OutputFormat::Png);

        let failure = engine.transform(&source, &spec).unwrap_err();
        assert_eq!(failure.reason, ErrorKind::Encode);
    }

    #[test]
    fn test_surface_budget() {
        assert!(check_surface_budget((10, 10), (10, 10), false).is_ok());
        assert!(check_surface_budget((10, 10), (4000, 3000), true).is_ok());
        assert!(matches!(
            check_surface_budget((10, 10), (20_000, 10_000), false),
            Err(EncodeError::SurfaceTooLarge { width: 20_000, height: 10_000, .. })
        ));
    }

    #[test]
    fn test_unstorable_name_is_recorded() {
        let engine = ImageTransformEngine::default();
        for (id, name) in [("abs", "/albums/summer"), ("up", "../escape")] {
            let source = png_source(id, name, 4, 4);
            let failure = engine.transform(&source, &TransformSpec::default()).unwrap_err();
            assert_eq!(failure.source_id, id);
            assert_eq!(failure.reason, ErrorKind::Encode);
        }
    }

    #[test]
    fn test_transform_is_deterministic() {
        let engine = ImageTransformEngine::new(EngineConfig {
            resample: ResampleFilter::Lanczos3,
        });
        let source = png_source("d", "det", 50, 40);
        let tone = ToneSpec {
            brightness: 10.0,
            contrast: -20.0,
            saturation: 35.0,
            blur: 1.5,
            ..ToneSpec::default()
        };
        let spec = spec(ResizeSpec::to(25, 25, true), tone, OutputFormat::Webp);

        let a = engine.transform(&source, &spec).unwrap();
        let b = engine.transform(&source, &spec).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_name() {
        assert_eq!(output_name("IMG_0001", OutputFormat::Webp), "IMG_0001.webp");
        assert_eq!(output_name("holiday.jpg", OutputFormat::Png), "holiday.jpg.png");
    }
}
