//! Lossy WebP encoding through libwebp.

use super::{check_rgba, EncodeError};
use crate::spec::OutputFormat;

/// Largest width or height libwebp can store.
pub const WEBP_MAX_DIMENSION: u32 = 16383;

/// Encode RGBA pixel data to lossy WebP bytes.
///
/// `quality` (1-100) maps directly onto libwebp's 0-100 quality factor.
pub fn encode_webp(pixels: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>, EncodeError> {
    check_rgba(pixels, width, height)?;

    if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
        return Err(EncodeError::EncodingFailed {
            format: OutputFormat::Webp,
            message: format!("{width}x{height} exceeds the {WEBP_MAX_DIMENSION}px WebP limit"),
        });
    }

    let quality = quality.clamp(1, 100) as f32;
    let encoded = ::webp::Encoder::from_rgba(pixels, width, height)
        .encode_simple(false, quality)
        .map_err(|err| EncodeError::EncodingFailed {
            format: OutputFormat::Webp,
            message: format!("libwebp error {err:?}"),
        })?;

    Ok(encoded.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_image;

    fn noisy(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| [(i * 31 % 256) as u8, (i * 17 % 256) as u8, (i * 7 % 256) as u8, 255])
            .collect()
    }

    #[test]
    fn test_webp_round_trip_dimensions() {
        let webp = encode_webp(&noisy(20, 10), 20, 10, 80).unwrap();
        let decoded = decode_image(&webp).unwrap();
        assert_eq!(decoded.dimensions(), (20, 10));
    }

    #[test]
    fn test_webp_rejects_oversized() {
        let width = WEBP_MAX_DIMENSION + 1;
        let pixels = vec![255u8; width as usize * 4];
        let result = encode_webp(&pixels, width, 1, 80);
        assert!(matches!(
            result,
            Err(EncodeError::EncodingFailed {
                format: OutputFormat::Webp,
                ..
            })
        ));
    }

    #[test]
    fn test_webp_degenerate_input_is_an_error() {
        assert!(matches!(
            encode_webp(&[], 0, 4, 80),
            Err(EncodeError::InvalidDimensions { width: 0, height: 4 })
        ));
        assert!(matches!(
            encode_webp(&[0u8; 8], 2, 2, 80),
            Err(EncodeError::InvalidPixelData { expected: 16, actual: 8 })
        ));
    }

    #[test]
    fn test_webp_single_pixel_at_quality_bounds() {
        let pixel = [200u8, 100, 50, 255];
        for quality in [1, 100] {
            let webp = encode_webp(&pixel, 1, 1, quality).unwrap();
            assert_eq!(decode_image(&webp).unwrap().dimensions(), (1, 1));
        }
    }

    #[test]
    fn test_webp_quality_affects_size() {
        let pixels = noisy(64, 64);
        let low = encode_webp(&pixels, 64, 64, 5).unwrap();
        let high = encode_webp(&pixels, 64, 64, 100).unwrap();
        assert!(high.len() > low.len());
    }
}
