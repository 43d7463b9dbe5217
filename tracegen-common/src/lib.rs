//! Common building blocks for tracegen
//!
//! This crate provides the pieces shared by the generator and its front ends:
//! - `distributions`: Seeded samplers (uniform, binomial, Zipfian family)
//! - `counter`: Insert-key allocation and the visible-key high-water mark
//! - `operation`: Operation kinds and emitted operations

pub mod counter;
pub mod distributions;
pub mod operation;

pub use counter::AcknowledgedCounter;
pub use distributions::{
    BinomialVariate, Distribution, ScrambledZipfianVariate, SkewedLatestVariate,
    UniformDistribution, UniformIntVariate, Variate, ZipfianGenerator, ZipfianVariate,
    ZIPFIAN_CONSTANT,
};
pub use operation::{Operation, OperationType};
