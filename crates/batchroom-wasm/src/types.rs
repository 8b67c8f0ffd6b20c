//! WASM-compatible wrapper types for batch results.
//!
//! This module provides JavaScript-friendly types that wrap the core Batchroom
//! types, handling the conversion between Rust and JavaScript data
//! representations.

use batchroom_core::{BatchExport, BatchSummary};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Output size returned by `resolve_output_dimensions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// The result of a batch run, handed back to JavaScript.
///
/// # Memory Management
///
/// The archive is stored in WASM memory. When you call `archive()`, a copy is
/// made to JavaScript memory as a `Uint8Array`. Call `free()` afterwards to
/// release a large archive early; otherwise wasm-bindgen's finalizer does it.
#[wasm_bindgen]
pub struct JsBatchExport {
    summary: BatchSummary,
    archive: Vec<u8>,
    file_name: String,
}

#[wasm_bindgen]
impl JsBatchExport {
    /// Archive bytes as a `Uint8Array` (a copy).
    pub fn archive(&self) -> Vec<u8> {
        self.archive.clone()
    }

    /// Plain object with counts, the "N of M succeeded" message, output
    /// metadata and failure reasons.
    pub fn report(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.summary.report())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter, js_name = succeededCount)]
    pub fn succeeded_count(&self) -> usize {
        self.summary.succeeded_count()
    }

    #[wasm_bindgen(getter, js_name = failedCount)]
    pub fn failed_count(&self) -> usize {
        self.summary.failed_count()
    }

    #[wasm_bindgen(getter, js_name = wasCancelled)]
    pub fn was_cancelled(&self) -> bool {
        self.summary.was_cancelled()
    }

    /// Suggested download name, e.g. `batchroom-export.tar`.
    #[wasm_bindgen(getter, js_name = archiveFileName)]
    pub fn archive_file_name(&self) -> String {
        self.file_name.clone()
    }

    /// Size of the archive in bytes.
    #[wasm_bindgen(getter, js_name = byteLength)]
    pub fn byte_length(&self) -> usize {
        self.archive.len()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {
        // Dropping self releases the archive
    }
}

impl From<BatchExport> for JsBatchExport {
    fn from(export: BatchExport) -> Self {
        let file_name = export.archive_file_name();
        Self {
            summary: export.summary,
            archive: export.archive.into_bytes(),
            file_name,
        }
    }
}
