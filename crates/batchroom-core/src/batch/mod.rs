//! Batch runner: drives the transform engine over an ordered list of sources.
//!
//! One image at a time, strictly in input order. A failed image is recorded
//! and the batch moves on. Cancellation is cooperative and only checked
//! between images, so an in-flight transform always finishes.
//!
//! Progress is pushed to a [`JobReporter`]. Reporter failures are logged and
//! otherwise ignored.

mod reporter;
mod runner;
mod summary;

pub use reporter::{BatchProgress, JobReporter, NoopReporter, ReporterError};
pub use runner::{BatchError, BatchRunner, CancelHandle, RunState};
pub use summary::{BatchExport, BatchReport, BatchSummary, OutputInfo};
