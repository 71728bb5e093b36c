//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::Examiner;

use super::types::{EngineConfig, INCENTIVE_RATE, RateConfig, ServiceConfig};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── rates.yaml      # Per-paper rate (incentive fixed at 10%)
/// ├── service.yaml    # Remote service, report and server settings
/// └── examiners.yaml  # Optional examiner seed for the in-memory store
/// ```
///
/// # Example
///
/// ```no_run
/// use examiner_payroll::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Per-paper rate: {}", loader.rates().per_paper_rate);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `rates.yaml` or `service.yaml` is missing
    /// - Either file contains invalid YAML
    /// - The per-paper rate is not positive or the incentive rate is not 10%
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let rates_path = path.join("rates.yaml");
        let rates = Self::load_yaml::<RateConfig>(&rates_path)?;
        Self::validate_rates(&rates, &rates_path)?;

        let service_path = path.join("service.yaml");
        let service = Self::load_yaml::<ServiceConfig>(&service_path)?;

        Ok(Self {
            config: EngineConfig::new(rates, service),
        })
    }

    /// Loads the optional examiner seed list from `examiners.yaml`.
    ///
    /// A missing file yields an empty list.
    pub fn load_examiners<P: AsRef<Path>>(path: P) -> EngineResult<Vec<Examiner>> {
        let seed_path = path.as_ref().join("examiners.yaml");
        if !seed_path.exists() {
            return Ok(Vec::new());
        }
        Self::load_yaml(&seed_path)
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    fn validate_rates(rates: &RateConfig, path: &Path) -> EngineResult<()> {
        if rates.per_paper_rate <= Decimal::ZERO {
            return Err(EngineError::ConfigParseError {
                path: path.display().to_string(),
                message: format!("per_paper_rate must be positive, got {}", rates.per_paper_rate),
            });
        }
        if rates.incentive_rate != INCENTIVE_RATE {
            return Err(EngineError::ConfigParseError {
                path: path.display().to_string(),
                message: format!(
                    "incentive_rate is fixed at {}, got {}",
                    INCENTIVE_RATE, rates.incentive_rate
                ),
            });
        }
        Ok(())
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the rate model.
    pub fn rates(&self) -> &RateConfig {
        self.config.rates()
    }

    /// Returns the service configuration.
    pub fn service(&self) -> &ServiceConfig {
        self.config.service()
    }
}
