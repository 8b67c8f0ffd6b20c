//! Batch runner WASM bindings.
//!
//! # Example
//!
//! ```typescript
//! import { JsBatchRunner } from '@batchroom/wasm';
//!
//! const runner = new JsBatchRunner();
//! const sources = files.map((f, i) => ({ id: String(i), displayName: f.stem, bytes: f.bytes }));
//! const result = runner.run(sources, spec, {
//!   onItemStart: (name, index, total) => console.log(`${index + 1}/${total}: ${name}`),
//!   onProgress: (fraction) => (bar.value = fraction),
//!   onComplete: (report) => console.log(report.message),
//! });
//! download(result.archive(), result.archiveFileName);
//! ```

use batchroom_core::{
    BatchProgress, BatchRunner, BatchSummary, JobReporter, ReporterError, SourceImage,
    TransformSpec,
};
use js_sys::{Array, Function, Object, Reflect, Uint8Array};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::types::JsBatchExport;

/// Runs batches from JavaScript. One run at a time per instance.
#[wasm_bindgen]
#[derive(Default)]
pub struct JsBatchRunner {
    inner: BatchRunner,
}

#[wasm_bindgen]
impl JsBatchRunner {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform every source and pack the successes into an archive.
    ///
    /// # Arguments
    ///
    /// * `sources` - array of `{ id, displayName, bytes: Uint8Array }`
    /// * `spec` - transform spec object; missing fields take defaults
    /// * `callbacks` - optional `{ onItemStart, onProgress, onComplete }`
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed source or spec, or when a run is
    /// already active on this runner. Per-image failures are not errors;
    /// they show up in the report.
    pub fn run(
        &self,
        sources: Array,
        spec: JsValue,
        callbacks: Option<Object>,
    ) -> Result<JsBatchExport, JsValue> {
        let sources = parse_sources(&sources)?;
        let spec: TransformSpec =
            serde_wasm_bindgen::from_value(spec).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let reporter = JsReporter::from_callbacks(callbacks.as_ref())?;
        debug!(sources = sources.len(), "Starting batch from JavaScript");

        self.inner
            .run_and_pack(&sources, &spec, &reporter)
            .map(JsBatchExport::from)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Stop the current run before its next image.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }
}

fn parse_sources(sources: &Array) -> Result<Vec<SourceImage>, JsValue> {
    sources
        .iter()
        .enumerate()
        .map(|(index, item)| parse_source(index, &item))
        .collect()
}

fn parse_source(index: usize, item: &JsValue) -> Result<SourceImage, JsValue> {
    let id = string_field(index, item, "id")?;
    let display_name = string_field(index, item, "displayName")?;
    let bytes: Uint8Array = Reflect::get(item, &JsValue::from_str("bytes"))?
        .dyn_into()
        .map_err(|_| source_error(index, "bytes must be a Uint8Array"))?;

    Ok(SourceImage::from_bytes(id, display_name, bytes.to_vec()))
}

fn string_field(index: usize, item: &JsValue, key: &str) -> Result<String, JsValue> {
    Reflect::get(item, &JsValue::from_str(key))?
        .as_string()
        .ok_or_else(|| source_error(index, &format!("{key} must be a string")))
}

fn source_error(index: usize, message: &str) -> JsValue {
    JsValue::from_str(&format!("Invalid source at index {index}: {message}"))
}

/// Forwards reporter hooks to optional JavaScript callbacks.
#[derive(Default)]
struct JsReporter {
    on_item_start: Option<Function>,
    on_progress: Option<Function>,
    on_complete: Option<Function>,
}

impl JsReporter {
    fn from_callbacks(callbacks: Option<&Object>) -> Result<Self, JsValue> {
        let Some(callbacks) = callbacks else {
            return Ok(Self::default());
        };
        Ok(Self {
            on_item_start: callback(callbacks, "onItemStart")?,
            on_progress: callback(callbacks, "onProgress")?,
            on_complete: callback(callbacks, "onComplete")?,
        })
    }
}

/// Look up an optional function property.
fn callback(callbacks: &Object, key: &str) -> Result<Option<Function>, JsValue> {
    let value = Reflect::get(callbacks, &JsValue::from_str(key))?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    value
        .dyn_into::<Function>()
        .map(Some)
        .map_err(|_| JsValue::from_str(&format!("{key} must be a function")))
}

fn reporter_error(err: JsValue) -> ReporterError {
    ReporterError::new(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl JobReporter for JsReporter {
    fn on_item_start(&self, name: &str, index: usize, total: usize) -> Result<(), ReporterError> {
        if let Some(f) = &self.on_item_start {
            f.call3(
                &JsValue::NULL,
                &JsValue::from_str(name),
                &JsValue::from(index as u32),
                &JsValue::from(total as u32),
            )
            .map_err(reporter_error)?;
        }
        Ok(())
    }

    fn on_progress(&self, progress: &BatchProgress<'_>) -> Result<(), ReporterError> {
        if let Some(f) = &self.on_progress {
            f.call1(&JsValue::NULL, &JsValue::from(progress.fraction()))
                .map_err(reporter_error)?;
        }
        Ok(())
    }

    fn on_complete(&self, summary: &BatchSummary) -> Result<(), ReporterError> {
        if let Some(f) = &self.on_complete {
            let report = serde_wasm_bindgen::to_value(&summary.report())
                .map_err(|e| ReporterError::new(e.to_string()))?;
            f.call1(&JsValue::NULL, &report).map_err(reporter_error)?;
        }
        Ok(())
    }
}
