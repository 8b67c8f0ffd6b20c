//! Batchroom WASM - WebAssembly bindings for Batchroom
//!
//! This crate provides WASM bindings to expose the batchroom-core batch
//! export pipeline to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `spec` - Transform spec validation and output size preview
//! - `runner` - Batch runner with progress callbacks and cancellation
//! - `types` - WASM-compatible wrapper types for batch results
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsBatchRunner } from '@batchroom/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const runner = new JsBatchRunner();
//! const result = runner.run(sources, { outputFormat: 'jpeg', quality: 85 });
//! console.log(`${result.succeededCount} images exported`);
//! ```

use wasm_bindgen::prelude::*;

mod runner;
mod spec;
mod types;

// Re-export public types
pub use runner::JsBatchRunner;
pub use spec::{resolve_output_dimensions, validate_transform_spec};
pub use types::{Dimensions, JsBatchExport};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // No tracing subscriber here; the host page decides where logs go
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
