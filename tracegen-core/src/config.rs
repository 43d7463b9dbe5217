//! Workload configuration
//!
//! `Configuration` is the single input of the generator. It is produced by a
//! loader (the CLI reads TOML profiles) and validated before any generator
//! state exists.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest value the generator will produce, in bytes.
pub const MAX_VALUE_LEN: u64 = 10240;

/// Default bound on every rejection-sampling loop.
pub const DEFAULT_MAX_RETRIES: u64 = 1_000_000;

/// Key selection distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyDistribution {
    /// Uniform over `[0, n_records]`
    #[default]
    Uniform,
    /// Scrambled Zipfian over the loaded keys plus expected inserts
    Zipfian,
    /// Skewed towards the most recently acknowledged writes
    Latest,
}

/// Scan length distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanLengthDistribution {
    #[default]
    Uniform,
    Zipfian,
}

/// Complete description of one workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct Configuration {
    /// Trace file written by `generate_to_file`
    pub export_path: PathBuf,
    /// Attach generated values to WRITEs
    pub gen_values: bool,
    pub value_min_size: u64,
    pub value_max_size: u64,
    /// Master seed for value lengths and characters
    pub value_seed: u64,
    pub key_seed: u64,
    pub operation_seed: u64,
    /// Records emitted by the loading phase (keys `0..n_records`)
    pub n_records: u64,
    /// Draws in the operations phase
    pub n_operations: u64,
    pub data_distribution: KeyDistribution,
    pub read_proportion: f64,
    pub update_proportion: f64,
    pub insert_proportion: f64,
    pub scan_proportion: f64,
    pub scan_seed: u64,
    pub scan_length_distribution: ScanLengthDistribution,
    pub min_scan_length: u64,
    pub max_scan_length: u64,
    /// Skew constant for every Zipfian-family sampler
    pub zipfian_theta: f64,
    /// Bound on rejection-sampling retries per draw
    pub max_retries: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            export_path: PathBuf::from("requests.trace"),
            gen_values: false,
            value_min_size: 0,
            value_max_size: 0,
            value_seed: 0,
            key_seed: 0,
            operation_seed: 0,
            n_records: 0,
            n_operations: 0,
            data_distribution: KeyDistribution::Uniform,
            read_proportion: 0.0,
            update_proportion: 0.0,
            insert_proportion: 0.0,
            scan_proportion: 0.0,
            scan_seed: 0,
            scan_length_distribution: ScanLengthDistribution::Uniform,
            min_scan_length: 1,
            max_scan_length: 1000,
            zipfian_theta: tracegen_common::ZIPFIAN_CONSTANT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Configuration {
    /// Reject configurations the generator cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.n_records == 0 {
            return Err(config_error("n_records must be > 0"));
        }

        let proportions = [
            ("read_proportion", self.read_proportion),
            ("update_proportion", self.update_proportion),
            ("insert_proportion", self.insert_proportion),
            ("scan_proportion", self.scan_proportion),
        ];
        for (name, value) in proportions {
            if !value.is_finite() || value < 0.0 {
                return Err(config_error(format!("{name} must be finite and >= 0, got {value}")));
            }
        }
        if self.total_proportion() <= 0.0 {
            return Err(config_error("at least one operation proportion must be > 0"));
        }

        if self.scan_proportion > 0.0 {
            if self.min_scan_length == 0 {
                return Err(config_error("min_scan_length must be > 0"));
            }
            if self.min_scan_length > self.max_scan_length {
                return Err(config_error(format!(
                    "min_scan_length ({}) must be <= max_scan_length ({})",
                    self.min_scan_length, self.max_scan_length
                )));
            }
        }

        if self.gen_values {
            if self.value_min_size > self.value_max_size {
                return Err(config_error(format!(
                    "value_min_size ({}) must be <= value_max_size ({})",
                    self.value_min_size, self.value_max_size
                )));
            }
            if self.value_max_size > MAX_VALUE_LEN {
                return Err(config_error(format!(
                    "value_max_size ({}) must be <= {}",
                    self.value_max_size, MAX_VALUE_LEN
                )));
            }
        }

        if !(0.0..1.0).contains(&self.zipfian_theta) {
            return Err(config_error(format!(
                "zipfian_theta must be in [0.0, 1.0), got {}",
                self.zipfian_theta
            )));
        }
        if self.max_retries == 0 {
            return Err(config_error("max_retries must be > 0"));
        }
        if self.data_distribution == KeyDistribution::Zipfian && self.zipfian_key_max().is_none() {
            return Err(config_error(format!(
                "n_records ({}) plus expected inserts ({}) overflows the Zipfian key range",
                self.n_records,
                self.expected_new_keys()
            )));
        }

        Ok(())
    }

    pub fn total_proportion(&self) -> f64 {
        self.read_proportion + self.update_proportion + self.insert_proportion + self.scan_proportion
    }

    /// Lines a full export writes: loading plus operations.
    pub fn total_records(&self) -> u64 {
        self.n_records.saturating_add(self.n_operations)
    }

    /// Inserts the scrambled Zipfian key range reserves room for.
    pub fn expected_new_keys(&self) -> u64 {
        (self.n_operations as f64 * self.insert_proportion * 2.0) as u64
    }

    /// Upper bound of the Zipfian key range, `None` if it does not fit in `u64`.
    pub fn zipfian_key_max(&self) -> Option<u64> {
        self.n_records
            .checked_add(self.expected_new_keys())
            .filter(|&max| max < u64::MAX)
    }
}

fn config_error(msg: impl Into<String>) -> Error {
    Error::Config(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_only(n_records: u64) -> Configuration {
        Configuration {
            n_records,
            n_operations: 10,
            read_proportion: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.data_distribution, KeyDistribution::Uniform);
        assert_eq!(config.min_scan_length, 1);
        assert_eq!(config.max_scan_length, 1000);
        assert_eq!(config.zipfian_theta, 0.99);
    }

    #[test]
    fn test_valid_read_only() {
        assert!(read_only(10).validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_records() {
        let err = read_only(0).validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_all_zero_proportions() {
        let config = Configuration { read_proportion: 0.0, ..read_only(10) };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_or_nan_proportion() {
        let config = Configuration { update_proportion: -0.5, ..read_only(10) };
        assert!(config.validate().is_err());

        let config = Configuration { scan_proportion: f64::NAN, ..read_only(10) };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scan_bounds_checked_only_when_scanning() {
        let config = Configuration { min_scan_length: 50, max_scan_length: 10, ..read_only(10) };
        assert!(config.validate().is_ok());

        let config = Configuration { scan_proportion: 0.1, ..config };
        assert!(config.validate().is_err());

        let config = Configuration { min_scan_length: 0, max_scan_length: 10, ..config };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_value_bounds() {
        let config = Configuration {
            gen_values: true,
            value_min_size: 20,
            value_max_size: 10,
            ..read_only(10)
        };
        assert!(config.validate().is_err());

        let config = Configuration { value_min_size: 1, value_max_size: MAX_VALUE_LEN + 1, ..config };
        assert!(config.validate().is_err());

        let config = Configuration { value_max_size: MAX_VALUE_LEN, ..config };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_theta_and_retries() {
        assert!(Configuration { zipfian_theta: 1.0, ..read_only(10) }.validate().is_err());
        assert!(Configuration { max_retries: 0, ..read_only(10) }.validate().is_err());
    }

    #[test]
    fn test_expected_new_keys() {
        let config = Configuration { n_operations: 1000, insert_proportion: 0.05, ..read_only(10) };
        assert_eq!(config.expected_new_keys(), 100);
        assert_eq!(config.total_records(), 1010);
        assert_eq!(config.zipfian_key_max(), Some(110));
    }

    #[test]
    fn test_rejects_overflowing_zipfian_key_range() {
        let config = Configuration {
            insert_proportion: 1e18,
            data_distribution: KeyDistribution::Zipfian,
            ..read_only(10)
        };
        assert_eq!(config.zipfian_key_max(), None);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Configuration { data_distribution: KeyDistribution::Zipfian, ..read_only(u64::MAX) };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        // Other key distributions never size a range from expected inserts.
        let config = Configuration { insert_proportion: 1e18, ..read_only(10) };
        assert!(config.validate().is_ok());
    }
}
