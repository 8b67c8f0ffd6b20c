//! Container sniffing and decoding via the `image` crate.

use std::io::Cursor;

use image::{ImageError, ImageReader, RgbaImage};

use super::DecodeError;

/// Decode image bytes into an RGBA8 surface.
///
/// # Arguments
///
/// * `bytes` - Raw file bytes (PNG, JPEG, WebP, GIF or BMP)
///
/// # Returns
///
/// The decoded pixels in natural orientation. Grayscale and RGB sources are
/// expanded to opaque RGBA.
///
/// # Errors
///
/// * `DecodeError::Empty` for zero-length input
/// * `DecodeError::InvalidFormat` when the container is not recognized
/// * `DecodeError::CorruptedFile` when decoding fails part way
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    let reader = guessed_reader(bytes)?;

    let img = reader.decode().map_err(map_image_error)?;

    if img.width() == 0 || img.height() == 0 {
        return Err(DecodeError::ZeroDimensions {
            width: img.width(),
            height: img.height(),
        });
    }

    Ok(img.into_rgba8())
}

/// Read only the header to get `(width, height)`.
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
    guessed_reader(bytes)?
        .into_dimensions()
        .map_err(map_image_error)
}

fn guessed_reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    Ok(reader)
}

fn map_image_error(err: ImageError) -> DecodeError {
    match err {
        ImageError::Unsupported(_) => DecodeError::InvalidFormat,
        other => DecodeError::CorruptedFile(other.to_string()),
    }
}
