//! Workload generation

pub mod generator;
pub mod selector;
pub mod value;

// Samplers live in tracegen-common
pub use tracegen_common::distributions;
pub use tracegen_common::{AcknowledgedCounter, Variate};

pub use generator::{Phase, WorkloadGenerator};
pub use selector::{OperationProportions, OperationSelector};
pub use value::{ValueGenerator, CHARSET};
