//! Configuration types for the payroll engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

/// The incentive paid on top of the base amount: exactly 10%.
pub const INCENTIVE_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Rate model applied to evaluated papers.
///
/// Loaded from `rates.yaml`. Only `per_paper_rate` is tunable; an
/// `incentive_rate` entry, when present, must equal [`INCENTIVE_RATE`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateConfig {
    /// Amount paid for every evaluated paper.
    pub per_paper_rate: Decimal,
    /// Fraction of the base amount paid as incentive.
    #[serde(default = "default_incentive_rate")]
    pub incentive_rate: Decimal,
}

impl RateConfig {
    /// Creates a rate model with the standard 10% incentive.
    pub fn new(per_paper_rate: Decimal) -> Self {
        Self {
            per_paper_rate,
            incentive_rate: default_incentive_rate(),
        }
    }
}

fn default_incentive_rate() -> Decimal {
    INCENTIVE_RATE
}

/// Settings for the remote computation service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteConfig {
    /// Whether the remote path is attempted at all.
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the service (no trailing slash required).
    #[serde(default)]
    pub base_url: String,
    /// How long to wait for the service before falling back.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl RemoteConfig {
    /// The remote timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    5_000
}

/// Report settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportConfig {
    /// Department label for examiners without one.
    #[serde(default = "default_unassigned_label")]
    pub unassigned_label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            unassigned_label: default_unassigned_label(),
        }
    }
}

fn default_unassigned_label() -> String {
    "Unassigned".to_string()
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

/// Service configuration from `service.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Remote computation service.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// The complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    rates: RateConfig,
    service: ServiceConfig,
}

impl EngineConfig {
    /// Creates a configuration from its component parts.
    pub fn new(rates: RateConfig, service: ServiceConfig) -> Self {
        Self { rates, service }
    }

    /// Returns the rate model.
    pub fn rates(&self) -> &RateConfig {
        &self.rates
    }

    /// Returns the service configuration.
    pub fn service(&self) -> &ServiceConfig {
        &self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_rate_config_defaults_incentive() {
        let rates: RateConfig = serde_yaml::from_str("per_paper_rate: \"20.00\"").unwrap();
        assert_eq!(rates.per_paper_rate, Decimal::from_str("20.00").unwrap());
        assert_eq!(rates.incentive_rate, Decimal::from_str("0.10").unwrap());
    }

    #[test]
    fn test_incentive_rate_constant_is_ten_percent() {
        assert_eq!(INCENTIVE_RATE, Decimal::from_str("0.10").unwrap());
        assert_eq!(INCENTIVE_RATE.scale(), 2);
    }

    #[test]
    fn test_service_config_defaults() {
        let service: ServiceConfig = serde_yaml::from_str("{}").unwrap();
        assert!(!service.remote.enabled);
        assert_eq!(service.remote.timeout(), Duration::from_secs(5));
        assert_eq!(service.report.unassigned_label, "Unassigned");
        assert_eq!(service.server.bind_address, "127.0.0.1:3000");
    }
}
