//! ITU-R BT.709 luminance, shared by the saturation and grayscale tone ops.

/// Red weight.
pub const LUMINANCE_R: f32 = 0.2126;

/// Green weight.
pub const LUMINANCE_G: f32 = 0.7152;

/// Blue weight.
pub const LUMINANCE_B: f32 = 0.0722;

/// Luminance of a normalized (0.0 to 1.0) RGB triple.
#[inline]
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    LUMINANCE_R * r + LUMINANCE_G * g + LUMINANCE_B * b
}
