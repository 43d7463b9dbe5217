//! Tracegen CLI library
//!
//! Exposes the profile types for integration tests and reuse.

pub mod completions;
pub mod config;
