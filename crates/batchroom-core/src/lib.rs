//! Batchroom Core - Batch image export library
//!
//! This crate applies one transform spec (resize, tone adjustments, output
//! format) to an ordered list of images and packs the results into a single
//! archive. It has no I/O of its own: bytes come in through [`ByteSource`]
//! and the archive goes out as an in-memory [`ArchiveBlob`].
//!
//! # Example
//!
//! ```ignore
//! use batchroom_core::{BatchRunner, NoopReporter, SourceImage, TransformSpec};
//!
//! let sources = vec![SourceImage::from_bytes("1", "beach", std::fs::read("beach.png")?)];
//! let export = BatchRunner::default().run_and_pack(&sources, &TransformSpec::default(), &NoopReporter)?;
//! println!("{}", export.summary.report().message);
//! ```

pub mod archive;
pub mod batch;
pub mod decode;
pub mod encode;
pub mod engine;
pub mod geometry;
pub mod luminance;
pub mod source;
pub mod spec;
pub mod tone;

pub use archive::{pack, ArchiveBlob, ArchiveError};
pub use batch::{
    BatchError, BatchExport, BatchProgress, BatchReport, BatchRunner, BatchSummary, CancelHandle,
    JobReporter, NoopReporter, ReporterError, RunState,
};
pub use decode::{DecodeError, ResampleFilter};
pub use encode::EncodeError;
pub use engine::{
    EngineConfig, ErrorKind, ImageTransformEngine, TransformFailure, TransformOutput,
    TransformResult,
};
pub use source::{ByteSource, FetchError, SourceImage};
pub use spec::{OutputFormat, ResizeSpec, SpecError, ToneSpec, TransformSpec};
pub use tone::ToneOp;
