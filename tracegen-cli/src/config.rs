//! TOML profile support
//!
//! A profile holds a `[workload]` table (the fields of
//! [`tracegen_core::Configuration`]) and an optional
//! `[output.requests]` table naming the trace file. Any value can be
//! overridden from the command line with `--set dotted.path=value` before the
//! profile is deserialized.

use anyhow::{bail, Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracegen_core::Configuration;

/// Top-level profile
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ProfileConfig {
    /// Free-form note shown in logs
    #[serde(default)]
    pub description: Option<String>,
    pub workload: Configuration,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output section
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct OutputConfig {
    #[serde(default)]
    pub requests: RequestsOutput,
}

/// Where the request trace goes
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct RequestsOutput {
    /// Takes precedence over `workload.export_path`
    #[serde(default)]
    pub export_path: Option<PathBuf>,
}

impl ProfileConfig {
    /// Load profile from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with_overrides(path, &[])
    }

    /// Load profile from TOML file, applying `--set` overrides first
    pub fn from_file_with_overrides<P: AsRef<Path>>(path: P, overrides: &[String]) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile: {}", path.display()))?;

        let mut value: toml::Value = toml::from_str(&content)
            .with_context(|| format!("Failed to parse profile: {}", path.display()))?;

        for override_str in overrides {
            let (key, val) = parse_key_value(override_str)
                .with_context(|| format!("Invalid override format: {}", override_str))?;
            set_toml_path(&mut value, &key, &val)
                .with_context(|| format!("Failed to apply override: {}", override_str))?;
        }

        let config: ProfileConfig = value
            .try_into()
            .with_context(|| format!("Invalid profile: {}", path.display()))?;
        Ok(config)
    }

    /// The generator configuration with the output path resolved.
    pub fn to_configuration(&self) -> Configuration {
        let mut config = self.workload.clone();
        if let Some(path) = &self.output.requests.export_path {
            config.export_path = path.clone();
        }
        config
    }

    pub fn validate(&self) -> Result<()> {
        let config = self.to_configuration();
        if config.export_path.as_os_str().is_empty() {
            bail!("export_path cannot be empty");
        }
        config.validate()?;
        Ok(())
    }
}

/// Split `key=value` at the first `=`.
fn parse_key_value(override_str: &str) -> Result<(String, String)> {
    match override_str.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => bail!("Invalid override format '{}'. Expected 'key=value'", override_str),
    }
}

/// Set `value_str` at a dotted table path, creating missing tables.
fn set_toml_path(root: &mut toml::Value, path: &str, value_str: &str) -> Result<()> {
    let keys: Vec<&str> = path.split('.').filter(|k| !k.is_empty()).collect();
    let Some((last, parents)) = keys.split_last() else {
        bail!("Empty path");
    };

    let mut current = root;
    for key in parents {
        let toml::Value::Table(table) = current else {
            bail!("Cannot navigate through non-table value at key '{}'", key);
        };
        current = table
            .entry(key.to_string())
            .or_insert(toml::Value::Table(Default::default()));
    }

    let toml::Value::Table(table) = current else {
        bail!("Cannot set key '{}' on non-table value", last);
    };
    table.insert(last.to_string(), parse_value(value_str));
    Ok(())
}

/// Infer a TOML value: bool, integer, float, otherwise string (quotes stripped).
fn parse_value(value_str: &str) -> toml::Value {
    let trimmed = value_str.trim();

    if let Ok(flag) = trimmed.parse::<bool>() {
        return toml::Value::Boolean(flag);
    }
    if let Ok(int_val) = trimmed.parse::<i64>() {
        return toml::Value::Integer(int_val);
    }
    if let Ok(float_val) = trimmed.parse::<f64>() {
        return toml::Value::Float(float_val);
    }

    let quoted = trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')));
    let string_val = if quoted { &trimmed[1..trimmed.len() - 1] } else { trimmed };
    toml::Value::String(string_val.to_string())
}
