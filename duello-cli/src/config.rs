//! CLI configuration loaded from `duello.toml`.
//!
//! Every section is optional; a missing file means defaults throughout.

use anyhow::{Context, Result};
use duello_core::{utils::parse_units, OracleParams};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON file holding registry, oracle and balances
    pub state_file: PathBuf,
    pub logging: LoggingConfig,
    pub oracle: OracleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("duello-state.json"),
            logging: LoggingConfig::default(),
            oracle: OracleConfig::default(),
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).with_writer(std::io::stderr).init();
            }
            _ => {
                fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "pretty".into(),
        }
    }
}

/// Oracle parameters applied when a state file is initialised.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Minimum bond as a decimal amount of the native asset
    pub min_bond: String,
    pub dispute_window_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        let params = OracleParams::default();
        Self {
            min_bond: duello_core::utils::format_units(params.min_bond),
            dispute_window_secs: params.dispute_window,
        }
    }
}

impl OracleConfig {
    pub fn params(&self) -> Result<OracleParams> {
        let min_bond = parse_units(&self.min_bond)
            .with_context(|| format!("Invalid oracle.min_bond: {}", self.min_bond))?;
        Ok(OracleParams {
            min_bond,
            dispute_window: self.dispute_window_secs,
        })
    }
}
