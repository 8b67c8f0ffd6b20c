//! Sequential batch execution.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::reporter::{BatchProgress, JobReporter, ReporterError};
use super::summary::{BatchExport, BatchSummary};
use crate::archive::{pack, ArchiveError};
use crate::engine::{EngineConfig, ImageTransformEngine, TransformResult};
use crate::source::SourceImage;
use crate::spec::{SpecError, TransformSpec};

/// Errors that stop a batch from running or finishing.
///
/// Per-image failures are not in here; they are recorded in the summary.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Invalid transform spec: {0}")]
    InvalidSpec(#[from] SpecError),

    #[error("A batch is already running on this runner")]
    AlreadyRunning,

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Lifecycle of a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Running = 1,
    Completed = 2,
    Cancelled = 3,
}

impl RunState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RunState::Running,
            2 => RunState::Completed,
            3 => RunState::Cancelled,
            _ => RunState::Idle,
        }
    }
}

/// Clonable handle that asks a running batch to stop before its next item.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Holds the runner in `Running`; stores the terminal state on drop.
struct RunGuard<'a> {
    state: &'a AtomicU8,
    outcome: RunState,
}

impl<'a> RunGuard<'a> {
    fn begin(state: &'a AtomicU8) -> Result<Self, BatchError> {
        state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != RunState::Running as u8).then_some(RunState::Running as u8)
            })
            .map_err(|_| BatchError::AlreadyRunning)?;

        // Unwinding out of a run leaves the runner usable again
        Ok(Self {
            state,
            outcome: RunState::Idle,
        })
    }

    fn finish(mut self, outcome: RunState) {
        self.outcome = outcome;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.store(self.outcome as u8, Ordering::Release);
    }
}

/// Mutable state of one run. Never leaves the `run` call.
struct BatchRunState {
    total: usize,
    completed_count: usize,
    current_item_name: String,
    results: Vec<TransformResult>,
    succeeded: usize,
    failed: usize,
}

impl BatchRunState {
    fn new(total: usize) -> Self {
        Self {
            total,
            completed_count: 0,
            current_item_name: String::new(),
            results: Vec::with_capacity(total),
            succeeded: 0,
            failed: 0,
        }
    }

    fn begin_item(&mut self, name: &str) {
        self.current_item_name.clear();
        self.current_item_name.push_str(name);
    }

    fn record(&mut self, result: TransformResult) {
        match &result {
            Ok(_) => self.succeeded += 1,
            Err(_) => self.failed += 1,
        }
        self.results.push(result);
        self.completed_count += 1;
    }

    fn progress(&self) -> BatchProgress<'_> {
        BatchProgress {
            completed: self.completed_count,
            total: self.total,
            current_item: &self.current_item_name,
            succeeded: self.succeeded,
            failed: self.failed,
        }
    }

    fn into_summary(self, was_cancelled: bool) -> BatchSummary {
        BatchSummary::new(self.results, self.total, was_cancelled)
    }
}

/// Runs batches one at a time.
///
/// All methods take `&self`, so a runner can be shared behind an `Arc`
/// (e.g. with a reporter that wants to cancel). A second `run` while one is
/// active, concurrent or re-entrant, fails with [`BatchError::AlreadyRunning`].
#[derive(Debug)]
pub struct BatchRunner {
    engine: ImageTransformEngine,
    state: AtomicU8,
    cancel: CancelHandle,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl BatchRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: ImageTransformEngine::new(config),
            state: AtomicU8::new(RunState::Idle as u8),
            cancel: CancelHandle::default(),
        }
    }

    /// Handle for cancelling the current (or next) run from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// Transform every source in order.
    ///
    /// Per-image failures are recorded in the summary and never abort the
    /// run. A cancelled run returns whatever finished before the request was
    /// noticed.
    ///
    /// # Errors
    ///
    /// * `BatchError::InvalidSpec` - nothing was processed and the reporter
    ///   was not called
    /// * `BatchError::AlreadyRunning` - another run holds this runner
    pub fn run(
        &self,
        sources: &[SourceImage],
        spec: &TransformSpec,
        reporter: &dyn JobReporter,
    ) -> Result<BatchSummary, BatchError> {
        spec.validate()?;
        let guard = RunGuard::begin(&self.state)?;
        self.cancel.reset();

        let total = sources.len();
        info!(total, format = ?spec.output_format, "Batch started");

        let mut state = BatchRunState::new(total);
        let mut was_cancelled = false;

        for (index, source) in sources.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(completed = state.completed_count, total, "Batch cancelled");
                was_cancelled = true;
                break;
            }

            state.begin_item(&source.display_name);
            notify("on_item_start", reporter.on_item_start(&source.display_name, index, total));

            let result = self.engine.transform(source, spec);
            debug!(index, source_id = %source.id, ok = result.is_ok(), "Item finished");
            state.record(result);

            notify("on_progress", reporter.on_progress(&state.progress()));
        }

        let summary = state.into_summary(was_cancelled);
        guard.finish(if was_cancelled {
            RunState::Cancelled
        } else {
            RunState::Completed
        });

        info!(
            succeeded = summary.succeeded_count(),
            failed = summary.failed_count(),
            was_cancelled,
            "Batch finished"
        );
        notify("on_complete", reporter.on_complete(&summary));

        Ok(summary)
    }

    /// [`run`](Self::run), then pack the successes into an archive.
    pub fn run_and_pack(
        &self,
        sources: &[SourceImage],
        spec: &TransformSpec,
        reporter: &dyn JobReporter,
    ) -> Result<BatchExport, BatchError> {
        let summary = self.run(sources, spec, reporter)?;
        let archive = pack(summary.succeeded())?;
        Ok(BatchExport { summary, archive })
    }
}

fn notify(hook: &'static str, result: Result<(), ReporterError>) {
    if let Err(err) = result {
        warn!(hook, "Reporter failed: {err}");
    }
}
