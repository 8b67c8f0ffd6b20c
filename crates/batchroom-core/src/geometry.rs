//! Output dimension resolution for a resize request.
//!
//! With aspect ratio preserved, one axis is locked to its target based on the
//! *source* orientation:
//!
//! - landscape or square (`w >= h`): width = `target_width`, height follows
//! - portrait (`w < h`): height = `target_height`, width follows
//!
//! This is not "fit within the target box". A 1000x900 source with a
//! 200x50 target resolves to 200x180, exceeding the target height.

use crate::spec::ResizeSpec;

/// Compute output pixel dimensions for a source of `source_width x source_height`.
///
/// Both outputs are at least 1.
///
/// # Example
///
/// ```ignore
/// use batchroom_core::geometry::resolve;
/// use batchroom_core::ResizeSpec;
///
/// let resize = ResizeSpec::to(640, 640, true);
/// assert_eq!(resolve(1920, 1080, &resize), (640, 360));
/// assert_eq!(resolve(800, 1200, &resize), (427, 640));
/// ```
pub fn resolve(source_width: u32, source_height: u32, resize: &ResizeSpec) -> (u32, u32) {
    debug_assert!(
        source_width > 0 && source_height > 0,
        "source dimensions must be positive"
    );

    if !resize.enabled {
        return (source_width.max(1), source_height.max(1));
    }

    if !resize.preserve_aspect_ratio {
        return (resize.target_width.max(1), resize.target_height.max(1));
    }

    locked_axis_dimensions(
        source_width.max(1),
        source_height.max(1),
        resize.target_width,
        resize.target_height,
    )
}

/// Lock the axis matching the source orientation and scale the other.
fn locked_axis_dimensions(width: u32, height: u32, target_width: u32, target_height: u32) -> (u32, u32) {
    let ratio = width as f64 / height as f64;

    if width >= height {
        let new_height = (target_width as f64 / ratio).round() as u32;
        (target_width.max(1), new_height.max(1))
    } else {
        let new_width = (target_height as f64 * ratio).round() as u32;
        (new_width.max(1), target_height.max(1))
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
