//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tripstats.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::ErrorPolicy;
use crate::cli::OutputFormat;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".tripstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Processing settings.
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where and how to read the trip export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path of the CSV export.
    #[serde(default = "default_input_path")]
    pub path: String,

    /// Field delimiter, a single ASCII character.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_input_path() -> String {
    "trips_data.csv".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl InputConfig {
    /// The delimiter as a byte. Falls back to a comma if unset.
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.bytes().next().unwrap_or(b',')
    }
}

/// Aggregation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// `abort` stops at the first malformed record, `skip` drops it.
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Label printed after the total spent.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Label printed after the total distance.
    #[serde(default = "default_distance_unit")]
    pub distance_unit: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            currency: default_currency(),
            distance_unit: default_distance_unit(),
        }
    }
}

fn default_currency() -> String {
    "RON".to_string()
}

fn default_distance_unit() -> String {
    "miles".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        let delimiter = &self.input.delimiter;
        if delimiter.len() != 1 || !delimiter.is_ascii() {
            bail!(
                "Delimiter must be a single ASCII character, got '{}'",
                delimiter
            );
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.input.path = input.display().to_string();
        }
        if let Some(delimiter) = args.delimiter {
            self.input.delimiter = delimiter.to_string();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }

        // Flags always override
        if args.lenient {
            self.processing.on_error = ErrorPolicy::Skip;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
