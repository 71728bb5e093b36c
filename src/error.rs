//! Error types for the examiner payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can surface from reconciliation, salary
//! computation, persistence and configuration loading.

use chrono::NaiveDate;
use thiserror::Error;

use crate::store::StoreError;

/// The main error type for the examiner payroll engine.
///
/// # Example
///
/// ```
/// use examiner_payroll::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/rates.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/rates.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or held invalid values.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// An evaluation day already exists for this examiner and date.
    #[error("Evaluation day for examiner '{examiner_id}' on {date} already exists")]
    Conflict {
        /// The examiner owning the day.
        examiner_id: String,
        /// The duplicated date.
        date: NaiveDate,
    },

    /// Every evaluation day failed to obtain an identity before computation.
    #[error("No valid evaluation days to calculate: {message}")]
    NoValidInput {
        /// Why the input set ended up empty.
        message: String,
    },

    /// The remote computation service failed. Never surfaced to callers;
    /// the salary calculator falls back to the local path instead.
    #[error("Remote computation failed: {message}")]
    RemoteComputation {
        /// A description of the remote failure.
        message: String,
    },

    /// The store rejected or failed an operation with no fallback left.
    #[error("Persistence error: {message}")]
    Persistence {
        /// A description of the persistence failure.
        message: String,
    },

    /// Input data violated a field constraint.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record that was looked up.
        entity: &'static str,
        /// The identity that was looked up.
        id: String,
    },

    /// A calculation is already in flight for this session.
    #[error("A calculation is already in progress for this session")]
    CalculationInProgress,
}

impl EngineError {
    /// Shorthand for a [`EngineError::Validation`] error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation { examiner_id, date } => EngineError::Conflict {
                examiner_id: examiner_id.to_string(),
                date,
            },
            StoreError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Persistence {
                message: other.to_string(),
            },
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
