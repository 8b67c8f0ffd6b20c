//! Transform specification for a batch run.
//!
//! A [`TransformSpec`] describes what happens to every image in a batch:
//! an optional resize, a set of tone adjustments, the output format and the
//! encoder quality. It is validated once when it is built (or deserialized)
//! and is `Copy`, so each pipeline invocation receives its own value and no
//! filter state is shared between runs.
//!
//! # Ranges
//!
//! | Field                      | Range         |
//! |----------------------------|---------------|
//! | `resize.target_width`      | `>= 1`        |
//! | `resize.target_height`     | `>= 1`        |
//! | `tone.brightness`          | `-100..=100`  |
//! | `tone.contrast`            | `-100..=100`  |
//! | `tone.saturation`          | `-100..=100`  |
//! | `tone.blur`                | `0..=20` px   |
//! | `quality`                  | `1..=100`     |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest and largest accepted tone percentage.
pub const TONE_PERCENT_RANGE: (f32, f32) = (-100.0, 100.0);

/// Largest accepted blur radius in pixels.
pub const MAX_BLUR_PX: f32 = 20.0;

/// Quality used when a spec does not name one.
pub const DEFAULT_QUALITY: u8 = 90;

/// Validation failures for a [`TransformSpec`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    /// A resize target dimension is zero.
    #[error("{field} must be a positive integer")]
    ZeroDimension { field: &'static str },

    /// A numeric field is NaN or infinite.
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    /// A numeric field is outside its accepted range.
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// Quality is outside 1..=100.
    #[error("quality must be within [1, 100], got {0}")]
    Quality(u8),
}

/// Resize request applied to every image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResizeSpec {
    /// When false the source dimensions are kept.
    pub enabled: bool,
    /// Target width in pixels.
    pub target_width: u32,
    /// Target height in pixels.
    pub target_height: u32,
    /// Lock one axis to its target and scale the other (see [`crate::geometry`]).
    pub preserve_aspect_ratio: bool,
}

impl Default for ResizeSpec {
    fn default() -> Self {
        Self {
            enabled: false,
            target_width: 1920,
            target_height: 1080,
            preserve_aspect_ratio: true,
        }
    }
}

impl ResizeSpec {
    /// An enabled resize to the given target box.
    pub fn to(target_width: u32, target_height: u32, preserve_aspect_ratio: bool) -> Self {
        Self {
            enabled: true,
            target_width,
            target_height,
            preserve_aspect_ratio,
        }
    }

    fn validate(&self) -> Result<(), SpecError> {
        if self.target_width == 0 {
            return Err(SpecError::ZeroDimension {
                field: "resize.targetWidth",
            });
        }
        if self.target_height == 0 {
            return Err(SpecError::ZeroDimension {
                field: "resize.targetHeight",
            });
        }
        Ok(())
    }
}

/// Tone adjustments applied to every image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToneSpec {
    /// Brightness (-100 to 100)
    pub brightness: f32,
    /// Contrast (-100 to 100)
    pub contrast: f32,
    /// Saturation (-100 to 100)
    pub saturation: f32,
    /// Gaussian blur radius in pixels (0 to 20)
    pub blur: f32,
    /// Convert to grayscale after saturation
    pub grayscale: bool,
    /// Apply a sepia tone after saturation
    pub sepia: bool,
}

impl ToneSpec {
    /// Create a neutral tone spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if every adjustment is neutral
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    fn validate(&self) -> Result<(), SpecError> {
        let (min, max) = TONE_PERCENT_RANGE;
        check_range("tone.brightness", self.brightness, min, max)?;
        check_range("tone.contrast", self.contrast, min, max)?;
        check_range("tone.saturation", self.saturation, min, max)?;
        check_range("tone.blur", self.blur, 0.0, MAX_BLUR_PX)
    }
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), SpecError> {
    if !value.is_finite() {
        return Err(SpecError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(SpecError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG; quality is ignored.
    Png,
    /// Baseline JPEG.
    #[default]
    #[serde(alias = "jpg")]
    Jpeg,
    /// Lossy WebP.
    Webp,
}

impl OutputFormat {
    /// File extension appended to output names.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
        }
    }

    /// MIME type of the encoded output.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }

    /// Whether the encoder accepts a quality setting.
    #[inline]
    pub fn is_lossy(self) -> bool {
        !matches!(self, OutputFormat::Png)
    }
}

/// Validated description of what to do to every image in a batch.
///
/// Build with [`TransformSpec::new`] or deserialize; both paths reject
/// out-of-range values. Fields are public for reading, and
/// [`TransformSpec::validate`] is re-run by the batch runner before any
/// image is touched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "UncheckedTransformSpec")]
pub struct TransformSpec {
    pub resize: ResizeSpec,
    pub tone: ToneSpec,
    pub output_format: OutputFormat,
    pub quality: u8,
}

impl Default for TransformSpec {
    fn default() -> Self {
        Self {
            resize: ResizeSpec::default(),
            tone: ToneSpec::default(),
            output_format: OutputFormat::default(),
            quality: DEFAULT_QUALITY,
        }
    }
}

impl TransformSpec {
    /// Build and validate a spec.
    pub fn new(
        resize: ResizeSpec,
        tone: ToneSpec,
        output_format: OutputFormat,
        quality: u8,
    ) -> Result<Self, SpecError> {
        let spec = Self {
            resize,
            tone,
            output_format,
            quality,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), SpecError> {
        self.resize.validate()?;
        self.tone.validate()?;
        if !(1..=100).contains(&self.quality) {
            return Err(SpecError::Quality(self.quality));
        }
        Ok(())
    }

    /// Quality forwarded to the encoder, `None` for lossless formats.
    pub fn encoder_quality(&self) -> Option<u8> {
        self.output_format.is_lossy().then_some(self.quality)
    }
}

/// Wire shape of a [`TransformSpec`] before validation.
#[derive(Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct UncheckedTransformSpec {
    resize: ResizeSpec,
    tone: ToneSpec,
    output_format: OutputFormat,
    quality: u8,
}

impl Default for UncheckedTransformSpec {
    fn default() -> Self {
        let spec = TransformSpec::default();
        Self {
            resize: spec.resize,
            tone: spec.tone,
            output_format: spec.output_format,
            quality: spec.quality,
        }
    }
}

impl TryFrom<UncheckedTransformSpec> for TransformSpec {
    type Error = SpecError;

    fn try_from(raw: UncheckedTransformSpec) -> Result<Self, Self::Error> {
        TransformSpec::new(raw.resize, raw.tone, raw.output_format, raw.quality)
    }
}
