//! Lossless PNG encoding.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{check_rgba, EncodeError};
use crate::spec::OutputFormat;

/// Encode RGBA pixel data to PNG bytes, keeping alpha.
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    check_rgba(pixels, width, height)?;

    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed {
            format: OutputFormat::Png,
            message: e.to_string(),
        })?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_image;

    #[test]
    fn test_png_is_lossless() {
        let pixels: Vec<u8> = (0..6 * 4 * 4).map(|i| (i * 37 % 256) as u8).collect();
        let png = encode_png(&pixels, 6, 4).unwrap();

        let decoded = decode_image(&png).unwrap();
        assert_eq!(decoded.dimensions(), (6, 4));
        assert_eq!(decoded.as_raw(), &pixels);
    }

    #[test]
    fn test_png_rejects_short_buffer() {
        let result = encode_png(&[0u8; 10], 2, 2);
        assert!(matches!(result, Err(EncodeError::InvalidPixelData { .. })));
    }
}
