//! Dashboard Configuration Module
//! Loads settings from an optional TOML file, then applies environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Public endpoint serving the earmark dataset as a JSON array of records.
pub const DEFAULT_ENDPOINT: &str = "http://191.252.193.11:5000/emendas";

/// Files searched (in order) when `EMENDAS_CONFIG` is not set.
const CONFIG_PATHS: [&str; 2] = ["emendas.toml", "config/emendas.toml"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Sizes used by the chart views, in logical pixels.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width per year slot in the grouped bar chart
    pub step_chart1: f32,
    /// Width per year inside each function facet
    pub step_facet2: f32,
    /// Width per modality inside each modality facet
    pub step_facet3: f32,
    pub height_chart1: f32,
    pub height_facet2: f32,
    pub height_facet3: f32,
    /// Function facets per row
    pub facet_columns: usize,
    pub max_content_width: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            step_chart1: 34.0,
            step_facet2: 26.0,
            step_facet3: 28.0,
            height_chart1: 280.0,
            height_facet2: 120.0,
            height_facet3: 140.0,
            facet_columns: 7,
            max_content_width: 1200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Year shown in the execution table
    pub execution_year: i32,
    pub layout: LayoutConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 60,
            execution_year: 2025,
            layout: LayoutConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load from the first config file found, then apply `EMENDAS_*` overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("EMENDAS_CONFIG")
            .map(PathBuf::from)
            .or_else(|| {
                CONFIG_PATHS
                    .iter()
                    .map(PathBuf::from)
                    .find(|p| p.exists())
            });

        let mut config = match path {
            Some(path) => {
                info!(path = %path.display(), "reading config file");
                Self::from_path(&path)?
            }
            None => {
                debug!("no config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("EMENDAS_ENDPOINT") {
            self.endpoint = endpoint;
        }

        if let Some(value) = lookup("EMENDAS_YEAR") {
            self.execution_year = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "EMENDAS_YEAR",
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("EMENDAS_TIMEOUT_SECS") {
            self.timeout_secs = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "EMENDAS_TIMEOUT_SECS",
                value: value.clone(),
            })?;
        }

        Ok(())
    }
}
