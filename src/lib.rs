//! Examiner payroll engine.
//!
//! This crate records examiners' evaluation days, reconciles their per-staff
//! paper counts, computes salaries (remotely when a computation service is
//! configured, locally otherwise) and aggregates calculations into
//! department-grouped reports.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod report;
pub mod store;
