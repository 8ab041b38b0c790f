use chrono::{Datelike, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::pipeline::rate_limiter::Limits;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Accepted range for `pipeline.reference_year`
pub const REFERENCE_YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=9999;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geocoding: GeocodingConfig,
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_seconds: u64,
    pub max_concurrency: usize,
    pub requests_per_min: Option<u64>,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com".to_string(),
            api_key_env: "GOOGLE_MAPS_API_KEY".to_string(),
            timeout_seconds: 10,
            max_concurrency: 4,
            requests_per_min: Some(3000),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Year ages are computed against; the current year when unset
    pub reference_year: Option<i32>,
    pub log_dir: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            reference_year: None,
            log_dir: "logs".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from `config.toml` when present, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(explicit) => explicit,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if !default_path.exists() {
                    return Ok(Self::default());
                }
                default_path
            }
        };
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.geocoding.max_concurrency == 0 {
            return Err(PipelineError::Config(
                "geocoding.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.geocoding.timeout_seconds == 0 {
            return Err(PipelineError::Config(
                "geocoding.timeout_seconds must be at least 1".to_string(),
            ));
        }
        if let Some(year) = self.pipeline.reference_year {
            if !REFERENCE_YEAR_RANGE.contains(&year) {
                return Err(PipelineError::Config(format!(
                    "pipeline.reference_year {year} is outside {}..={}",
                    REFERENCE_YEAR_RANGE.start(),
                    REFERENCE_YEAR_RANGE.end()
                )));
            }
        }
        Ok(())
    }

    /// Geocoding API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        let var = &self.geocoding.api_key_env;
        let key = std::env::var(var)?;
        if key.trim().is_empty() {
            return Err(PipelineError::Config(format!("Environment variable {var} is empty")));
        }
        Ok(key)
    }

    pub fn reference_year(&self) -> i32 {
        self.pipeline.reference_year.unwrap_or_else(|| Utc::now().year())
    }

    pub fn limits(&self) -> Limits {
        Limits {
            requests_per_min: self.geocoding.requests_per_min,
            concurrency: self.geocoding.max_concurrency,
        }
    }
}
