//! Tracegen Core Library
//!
//! Configuration, the phased workload generator, the trace file codec and
//! the export driver of the tracegen request-trace generator. The numeric
//! samplers live in `tracegen-common`.

pub mod config;
pub mod error;
pub mod export;
pub mod progress;
pub mod seed;
pub mod workload;

pub use config::{Configuration, KeyDistribution, ScanLengthDistribution};
pub use error::{Error, Result};
pub use export::{GenerationSummary, TraceWriter};
pub use progress::{ProgressHandle, ProgressReporter};
pub use workload::{Phase, WorkloadGenerator};
