//! Progress notifications out of a running batch.

use thiserror::Error;

use super::summary::BatchSummary;

/// A reporter hook failed. Logged by the runner, never propagated.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ReporterError {
    message: String,
}

impl ReporterError {
    pub fn new<T: Into<String>>(message: T) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Read-only snapshot handed to [`JobReporter::on_progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress<'a> {
    /// Items attempted so far, successes and failures alike.
    pub completed: usize,
    pub total: usize,
    /// Display name of the item that just finished.
    pub current_item: &'a str,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchProgress<'_> {
    /// `completed / total` in `[0, 1]`. An empty batch counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}

/// Observer for a batch run. Every hook defaults to a no-op.
///
/// Hooks are called synchronously on the runner's thread, in order:
/// `on_item_start` then `on_progress` for each item, then `on_complete` once.
pub trait JobReporter {
    fn on_item_start(&self, _name: &str, _index: usize, _total: usize) -> Result<(), ReporterError> {
        Ok(())
    }

    fn on_progress(&self, _progress: &BatchProgress<'_>) -> Result<(), ReporterError> {
        Ok(())
    }

    fn on_complete(&self, _summary: &BatchSummary) -> Result<(), ReporterError> {
        Ok(())
    }
}

/// Reporter that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl JobReporter for NoopReporter {}
