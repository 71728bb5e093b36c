//! Configuration loading and management for the payroll engine.
//!
//! This module loads the rate model and service settings from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use examiner_payroll::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Per-paper rate: {}", config.rates().per_paper_rate);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    EngineConfig, INCENTIVE_RATE, RateConfig, RemoteConfig, ReportConfig, ServerConfig,
    ServiceConfig,
};
