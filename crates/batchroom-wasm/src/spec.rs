//! Transform spec WASM bindings.
//!
//! Lets the UI check a spec and preview output sizes before starting a batch.
//!
//! # Example
//!
//! ```typescript
//! import { validate_transform_spec, resolve_output_dimensions } from '@batchroom/wasm';
//!
//! const spec = validate_transform_spec({ outputFormat: 'webp', quality: 80 });
//! const { width, height } = resolve_output_dimensions(1920, 1080, spec.resize);
//! ```

use batchroom_core::{geometry, ResizeSpec, TransformSpec};
use wasm_bindgen::prelude::*;

use crate::types::Dimensions;

/// Validate a transform spec and return it normalized, with defaults filled.
///
/// # Errors
///
/// Returns an error naming the first out-of-range field.
#[wasm_bindgen]
pub fn validate_transform_spec(spec: JsValue) -> Result<JsValue, JsValue> {
    let spec: TransformSpec =
        serde_wasm_bindgen::from_value(spec).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&spec).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Compute the output size of a `width x height` source under `resize`.
#[wasm_bindgen]
pub fn resolve_output_dimensions(width: u32, height: u32, resize: JsValue) -> Result<JsValue, JsValue> {
    let resize: ResizeSpec =
        serde_wasm_bindgen::from_value(resize).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&dimensions(width, height, &resize))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

pub(crate) fn dimensions(width: u32, height: u32, resize: &ResizeSpec) -> Dimensions {
    let (width, height) = geometry::resolve(width, height, resize);
    Dimensions { width, height }
}
