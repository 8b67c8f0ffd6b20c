//! Tone/filter compositor.
//!
//! [`compose`] turns a [`ToneSpec`] into an ordered list of typed [`ToneOp`]s
//! and [`apply_tone_ops`] runs that list over a floating-point RGBA surface.
//!
//! ## Op Order
//! 1. Brightness
//! 2. Contrast
//! 3. Saturation
//! 4. Grayscale (toggle)
//! 5. Sepia (toggle)
//! 6. Blur
//!
//! The order is fixed regardless of how the tone settings were written. Ops whose
//! parameter is neutral are left out of the list; running a neutral op would
//! produce the same 8-bit output.
//!
//! ## Parameter Domains
//! Percentages (-100 to 100) are divided by 100 into `[-1, 1]`. Blur radii in
//! pixels are divided by [`BLUR_SIGMA_DIVISOR`] to give the Gaussian sigma.
//!
//! Every op works in normalized `[0, 1]` channel space and leaves alpha alone.

use image::Rgba32FImage;

use crate::luminance::luminance;
use crate::spec::ToneSpec;

/// Divisor from blur radius (px) to Gaussian sigma.
pub const BLUR_SIGMA_DIVISOR: f32 = 2.0;

/// Kernel half-width in multiples of sigma.
const BLUR_KERNEL_SIGMAS: f32 = 3.0;

/// One deterministic pixel adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToneOp {
    /// Additive shift, `amount` in `[-1, 1]`.
    Brightness { amount: f32 },
    /// Scale around mid-gray by `1 + amount`, `amount` in `[-1, 1]`.
    Contrast { amount: f32 },
    /// Scale away from luminance by `1 + amount`, `amount` in `[-1, 1]`.
    Saturation { amount: f32 },
    /// Replace RGB with luminance.
    Grayscale,
    /// Classic sepia matrix.
    Sepia,
    /// Separable Gaussian blur.
    Blur { sigma: f32 },
}

impl ToneOp {
    fn is_per_pixel(&self) -> bool {
        !matches!(self, ToneOp::Blur { .. })
    }
}

/// Build the ordered op pipeline for a tone spec.
///
/// # Example
/// ```ignore
/// use batchroom_core::tone::{compose, ToneOp};
/// use batchroom_core::ToneSpec;
///
/// let mut tone = ToneSpec::new();
/// tone.blur = 4.0;
/// tone.brightness = 50.0;
///
/// assert_eq!(
///     compose(&tone),
///     vec![ToneOp::Brightness { amount: 0.5 }, ToneOp::Blur { sigma: 2.0 }]
/// );
/// ```
pub fn compose(tone: &ToneSpec) -> Vec<ToneOp> {
    let mut ops = Vec::with_capacity(6);

    if tone.brightness != 0.0 {
        ops.push(ToneOp::Brightness {
            amount: percent_to_unit(tone.brightness),
        });
    }
    if tone.contrast != 0.0 {
        ops.push(ToneOp::Contrast {
            amount: percent_to_unit(tone.contrast),
        });
    }
    if tone.saturation != 0.0 {
        ops.push(ToneOp::Saturation {
            amount: percent_to_unit(tone.saturation),
        });
    }
    if tone.grayscale {
        ops.push(ToneOp::Grayscale);
    }
    if tone.sepia {
        ops.push(ToneOp::Sepia);
    }
    if tone.blur > 0.0 {
        ops.push(ToneOp::Blur {
            sigma: tone.blur / BLUR_SIGMA_DIVISOR,
        });
    }

    ops
}

#[inline]
fn percent_to_unit(percent: f32) -> f32 {
    (percent / 100.0).clamp(-1.0, 1.0)
}

/// Run `ops` over `surface` in order.
///
/// Channel values are clamped to `[0, 1]` after each op. No quantization
/// happens here; callers convert to 8-bit once at the end.
pub fn apply_tone_ops(surface: &mut Rgba32FImage, ops: &[ToneOp]) {
    for op in ops {
        if op.is_per_pixel() {
            for pixel in surface.pixels_mut() {
                let [r, g, b, a] = pixel.0;
                let (r, g, b) = apply_pixel_op(op, r, g, b);
                pixel.0 = [r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0), a];
            }
        } else if let ToneOp::Blur { sigma } = *op {
            gaussian_blur(surface, sigma);
        }
    }
}

#[inline]
fn apply_pixel_op(op: &ToneOp, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    match *op {
        ToneOp::Brightness { amount } => (r + amount, g + amount, b + amount),
        ToneOp::Contrast { amount } => {
            let factor = 1.0 + amount;
            let midpoint = 0.5;
            (
                (r - midpoint) * factor + midpoint,
                (g - midpoint) * factor + midpoint,
                (b - midpoint) * factor + midpoint,
            )
        }
        ToneOp::Saturation { amount } => {
            let gray = luminance(r, g, b);
            let factor = 1.0 + amount;
            (
                gray + (r - gray) * factor,
                gray + (g - gray) * factor,
                gray + (b - gray) * factor,
            )
        }
        ToneOp::Grayscale => {
            let gray = luminance(r, g, b);
            (gray, gray, gray)
        }
        ToneOp::Sepia => (
            0.393 * r + 0.769 * g + 0.189 * b,
            0.349 * r + 0.686 * g + 0.168 * b,
            0.272 * r + 0.534 * g + 0.131 * b,
        ),
        ToneOp::Blur { .. } => (r, g, b),
    }
}

/// Normalized 1-D Gaussian kernel covering `±3 sigma`.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * BLUR_KERNEL_SIGMAS).ceil().max(0.0) as usize;
    if radius == 0 {
        return vec![1.0];
    }

    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-(x * x) / two_sigma_sq).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Blur in premultiplied space with clamped edges, horizontal then vertical.
fn gaussian_blur(surface: &mut Rgba32FImage, sigma: f32) {
    let kernel = gaussian_kernel(sigma);
    if kernel.len() == 1 {
        return;
    }
    let radius = (kernel.len() / 2) as i64;
    let (width, height) = surface.dimensions();
    let (w, h) = (width as i64, height as i64);

    let mut premultiplied: Vec<[f32; 4]> = surface
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            [r * a, g * a, b * a, a]
        })
        .collect();
    let mut scratch = vec![[0.0f32; 4]; premultiplied.len()];

    let passes: [(i64, i64); 2] = [(1, 0), (0, 1)];
    for (dx, dy) in passes {
        for y in 0..h {
            for x in 0..w {
                let mut acc = [0.0f32; 4];
                for (k, weight) in kernel.iter().enumerate() {
                    let offset = k as i64 - radius;
                    let sx = (x + offset * dx).clamp(0, w - 1);
                    let sy = (y + offset * dy).clamp(0, h - 1);
                    let src = premultiplied[(sy * w + sx) as usize];
                    for c in 0..4 {
                        acc[c] += src[c] * weight;
                    }
                }
                scratch[(y * w + x) as usize] = acc;
            }
        }
        std::mem::swap(&mut premultiplied, &mut scratch);
    }

    for (pixel, [r, g, b, a]) in surface.pixels_mut().zip(premultiplied) {
        let a = a.clamp(0.0, 1.0);
        pixel.0 = if a > 0.0 {
            [
                (r / a).clamp(0.0, 1.0),
                (g / a).clamp(0.0, 1.0),
                (b / a).clamp(0.0, 1.0),
                a,
            ]
        } else {
            [0.0, 0.0, 0.0, 0.0]
        };
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn percent() -> impl Strategy<Value = f32> {
        -100.0f32..=100.0
    }

    fn rank(op: &ToneOp) -> u8 {
        match op {
            ToneOp::Brightness { .. } => 0,
            ToneOp::Contrast { .. } => 1,
            ToneOp::Saturation { .. } => 2,
            ToneOp::Grayscale => 3,
            ToneOp::Sepia => 4,
            ToneOp::Blur { .. } => 5,
        }
    }

    proptest! {
        /// Property: Composed ops are always in canonical order.
        #[test]
        fn prop_compose_is_ordered(
            brightness in percent(),
            contrast in percent(),
            saturation in percent(),
            blur in 0.0f32..=20.0,
            grayscale in any::<bool>(),
            sepia in any::<bool>(),
        ) {
            let tone = ToneSpec { brightness, contrast, saturation, blur, grayscale, sepia };
            let ops = compose(&tone);
            let ranks: Vec<u8> = ops.iter().map(rank).collect();
            let mut sorted = ranks.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(ranks, sorted);
        }

        /// Property: Converted amounts stay in [-1, 1].
        #[test]
        fn prop_amounts_in_unit_range(
            brightness in percent(),
            contrast in percent(),
            saturation in percent(),
        ) {
            let tone = ToneSpec { brightness, contrast, saturation, ..ToneSpec::default() };
            for op in compose(&tone) {
                match op {
                    ToneOp::Brightness { amount }
                    | ToneOp::Contrast { amount }
                    | ToneOp::Saturation { amount } => prop_assert!((-1.0..=1.0).contains(&amount)),
                    _ => {}
                }
            }
        }

        /// Property: Output channels stay within [0, 1].
        #[test]
        fn prop_channels_stay_normalized(
            r in 0u8..=255, g in 0u8..=255, b in 0u8..=255,
            brightness in percent(),
            contrast in percent(),
            saturation in percent(),
            sepia in any::<bool>(),
        ) {
            let tone = ToneSpec { brightness, contrast, saturation, sepia, ..ToneSpec::default() };
            let mut surface = Rgba32FImage::from_pixel(
                1, 1,
                image::Rgba([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]),
            );
            apply_tone_ops(&mut surface, &compose(&tone));
            for c in surface.get_pixel(0, 0).0 {
                prop_assert!((0.0..=1.0).contains(&c));
            }
        }
    }
}
