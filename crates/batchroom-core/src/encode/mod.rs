//! Output encoding.
//!
//! This module provides functionality for:
//! - Encoding RGBA surfaces to PNG (lossless, alpha kept)
//! - Encoding to JPEG with configurable quality (alpha flattened onto black)
//! - Encoding to lossy WebP with configurable quality
//!
//! [`encode`] dispatches on [`OutputFormat`]. Quality only reaches the lossy
//! encoders; PNG ignores it.
//!
//! # Examples
//!
//! ```ignore
//! use batchroom_core::encode::encode;
//! use batchroom_core::OutputFormat;
//!
//! let surface = image::RgbaImage::new(100, 100);
//! let bytes = encode(&surface, OutputFormat::Jpeg, 90).unwrap();
//! println!("Encoded {} bytes", bytes.len());
//! ```

mod jpeg;
mod png;
mod webp;

use image::RgbaImage;
use thiserror::Error;

use crate::spec::OutputFormat;

pub use self::jpeg::encode_jpeg;
pub use self::png::encode_png;
pub use self::webp::encode_webp;

/// Errors that can occur while encoding an output surface.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The surface needed to render the output would exceed the allocation limit
    #[error("Output surface {width}x{height} needs more than {limit} bytes")]
    SurfaceTooLarge { width: u32, height: u32, limit: u64 },

    /// The codec rejected the image
    #[error("{format:?} encoding failed: {message}")]
    EncodingFailed {
        format: OutputFormat,
        message: String,
    },
}

/// Encode an RGBA surface to `format`.
///
/// `quality` (1-100) is forwarded to JPEG and WebP only.
pub fn encode(surface: &RgbaImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = surface.dimensions();
    let pixels = surface.as_raw();

    match format {
        OutputFormat::Png => encode_png(pixels, width, height),
        OutputFormat::Jpeg => encode_jpeg(pixels, width, height, quality),
        OutputFormat::Webp => encode_webp(pixels, width, height, quality),
    }
}

/// Check dimensions and RGBA buffer length before handing off to a codec.
pub(crate) fn check_rgba(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * 4;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_dispatch_magic_bytes() {
        let surface = RgbaImage::from_pixel(8, 8, Rgba([10, 200, 30, 255]));

        let png = encode(&surface, OutputFormat::Png, 90).unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");

        let jpeg = encode(&surface, OutputFormat::Jpeg, 90).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);

        let webp = encode(&surface, OutputFormat::Webp, 90).unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn test_zero_sized_surface_fails_for_every_format() {
        let surface = RgbaImage::new(0, 5);
        for format in [OutputFormat::Png, OutputFormat::Jpeg, OutputFormat::Webp] {
            let result = encode(&surface, format, 80);
            assert!(
                matches!(result, Err(EncodeError::InvalidDimensions { width: 0, height: 5 })),
                "{format:?} should reject an empty surface"
            );
        }
    }

    #[test]
    fn test_png_ignores_quality() {
        let surface = RgbaImage::from_fn(12, 9, |x, y| Rgba([(x * 20) as u8, (y * 25) as u8, 7, 255]));
        let low = encode(&surface, OutputFormat::Png, 1).unwrap();
        let high = encode(&surface, OutputFormat::Png, 100).unwrap();
        assert_eq!(low, high);
    }

    #[test]
    fn test_check_rgba_length() {
        assert!(check_rgba(&[0u8; 16], 2, 2).is_ok());
        assert!(matches!(
            check_rgba(&[0u8; 15], 2, 2),
            Err(EncodeError::InvalidPixelData {
                expected: 16,
                actual: 15
            })
        ));
    }
}
