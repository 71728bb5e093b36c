//! Relational store abstraction.
//!
//! The engine never owns its storage. Everything it persists goes through
//! the [`EvaluationStore`] trait, which models the handful of table
//! operations the engine needs: equality lookups, batch upsert by identity,
//! batch delete by identity set, and the calculation/day link join.
//!
//! Implementations must treat each batch call as all-or-nothing.
//! [`InMemoryStore`] is the bundled implementation used by tests and the
//! demo server.

mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{
    Calculation, CalculationDayLink, CalculationId, DayId, Examiner, ExaminerId, NewCalculation,
    StaffEvaluation, StaffId, StaffUpsert,
};

pub use memory::InMemoryStore;

/// Errors raised by a store implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The `(examiner, date)` uniqueness constraint on evaluation days was violated.
    #[error("Duplicate evaluation day for examiner {examiner_id} on {date}")]
    UniqueViolation {
        /// The examiner owning the day.
        examiner_id: ExaminerId,
        /// The duplicated date.
        date: NaiveDate,
    },

    /// A row referenced by a write does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of row.
        entity: &'static str,
        /// The missing identity.
        id: String,
    },

    /// Any other backend failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// An evaluation day row as stored, without its staff rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRow {
    /// Store-assigned identity.
    pub id: DayId,
    /// The owning examiner.
    pub examiner_id: ExaminerId,
    /// The calendar date.
    pub date: NaiveDate,
}

/// Table-level operations over examiners, evaluation days, staff
/// evaluations, calculations and calculation/day links.
#[async_trait]
pub trait EvaluationStore: Send + Sync {
    /// Looks up an examiner.
    async fn get_examiner(&self, id: ExaminerId) -> Result<Option<Examiner>, StoreError>;

    /// Finds the day an examiner recorded for a date.
    async fn find_day(
        &self,
        examiner_id: ExaminerId,
        date: NaiveDate,
    ) -> Result<Option<DayRow>, StoreError>;

    /// Inserts a day. Fails with [`StoreError::UniqueViolation`] when the
    /// examiner already has a day for that date.
    async fn insert_day(
        &self,
        examiner_id: ExaminerId,
        date: NaiveDate,
    ) -> Result<DayRow, StoreError>;

    /// Looks up a day row.
    async fn get_day(&self, id: DayId) -> Result<Option<DayRow>, StoreError>;

    /// Lists an examiner's day rows ordered by date.
    async fn list_days(&self, examiner_id: ExaminerId) -> Result<Vec<DayRow>, StoreError>;

    /// Deletes a day and, by cascade, its staff rows and link rows.
    /// Returns false when the day did not exist.
    async fn delete_day(&self, id: DayId) -> Result<bool, StoreError>;

    /// Fetches a day's staff rows in stored order.
    async fn staff_for_day(&self, day_id: DayId) -> Result<Vec<StaffEvaluation>, StoreError>;

    /// Deletes staff rows by identity in one batch. Returns the number removed.
    async fn delete_staff(&self, ids: &[StaffId]) -> Result<usize, StoreError>;

    /// Upserts staff rows in one batch keyed by identity. Rows without an
    /// identity are inserted. Returns the stored rows in input order.
    async fn upsert_staff(
        &self,
        rows: Vec<StaffUpsert>,
    ) -> Result<Vec<StaffEvaluation>, StoreError>;

    /// Inserts a calculation row, assigning its identity and timestamp.
    async fn insert_calculation(
        &self,
        calculation: NewCalculation,
    ) -> Result<Calculation, StoreError>;

    /// Looks up a calculation.
    async fn get_calculation(&self, id: CalculationId) -> Result<Option<Calculation>, StoreError>;

    /// Lists an examiner's calculations ordered by creation time.
    async fn list_calculations(
        &self,
        examiner_id: ExaminerId,
    ) -> Result<Vec<Calculation>, StoreError>;

    /// Inserts link rows in one batch. Returns the number inserted.
    async fn insert_links(&self, links: Vec<CalculationDayLink>) -> Result<usize, StoreError>;

    /// Day identities linked to a calculation, in link order.
    async fn linked_day_ids(&self, calculation_id: CalculationId)
    -> Result<Vec<DayId>, StoreError>;
}
