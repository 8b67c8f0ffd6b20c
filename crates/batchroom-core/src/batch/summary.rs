//! Terminal results of a batch run.

use serde::{Deserialize, Serialize};

use crate::archive::{archive_file_name, ArchiveBlob, DEFAULT_ARCHIVE_STEM};
use crate::engine::{TransformFailure, TransformOutput, TransformResult};
use crate::spec::OutputFormat;

/// Per-item results of a finished or cancelled run, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    results: Vec<TransformResult>,
    total: usize,
    was_cancelled: bool,
}

impl BatchSummary {
    pub(crate) fn new(results: Vec<TransformResult>, total: usize, was_cancelled: bool) -> Self {
        Self {
            results,
            total,
            was_cancelled,
        }
    }

    /// Every attempted item, successes and failures interleaved.
    pub fn results(&self) -> &[TransformResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<TransformResult> {
        self.results
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &TransformOutput> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TransformFailure> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    /// Number of sources the run was started with.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of sources actually attempted.
    pub fn processed(&self) -> usize {
        self.results.len()
    }

    pub fn was_cancelled(&self) -> bool {
        self.was_cancelled
    }

    /// Serializable report without payload bytes.
    pub fn report(&self) -> BatchReport {
        let succeeded = self.succeeded_count();
        BatchReport {
            message: format!("{} of {} succeeded", succeeded, self.total),
            total: self.total,
            processed: self.processed(),
            succeeded,
            failed: self.failed_count(),
            was_cancelled: self.was_cancelled,
            outputs: self.succeeded().map(OutputInfo::from).collect(),
            failures: self.failed().cloned().collect(),
        }
    }
}

/// Metadata of one produced file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    /// Encoded size in bytes.
    pub size: usize,
}

impl From<&TransformOutput> for OutputInfo {
    fn from(output: &TransformOutput) -> Self {
        Self {
            name: output.name.clone(),
            width: output.width,
            height: output.height,
            format: output.format,
            size: output.bytes.len(),
        }
    }
}

/// User-facing outcome of a run, e.g. "8 of 10 succeeded" plus the reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub message: String,
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub was_cancelled: bool,
    pub outputs: Vec<OutputInfo>,
    pub failures: Vec<TransformFailure>,
}

/// A run's summary together with the archive of its successes.
#[derive(Debug, Clone)]
pub struct BatchExport {
    pub summary: BatchSummary,
    pub archive: ArchiveBlob,
}

impl BatchExport {
    /// Suggested download name for the archive.
    pub fn archive_file_name(&self) -> String {
        archive_file_name(DEFAULT_ARCHIVE_STEM)
    }
}
