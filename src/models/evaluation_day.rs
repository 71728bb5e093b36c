//! Evaluation day and staff evaluation models.
//!
//! An [`EvaluationDay`] is one date on which an examiner evaluated papers,
//! with the per-staff counts stored as [`StaffEvaluation`] rows. The day's
//! totals are always derived from the rows it was built with.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DayId, ExaminerId, StaffId};

/// One staff member's paper count for one evaluation day, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffEvaluation {
    /// Store-assigned identity.
    pub id: StaffId,
    /// The evaluation day this row belongs to.
    pub day_id: DayId,
    /// Staff display name.
    pub staff_name: String,
    /// Number of papers evaluated.
    pub papers_evaluated: u32,
}

/// An evaluation day together with its staff rows.
///
/// `total_papers` and `staff_count` are computed in [`EvaluationDay::new`]
/// from the rows passed in and cannot be set independently.
///
/// # Example
///
/// ```
/// use examiner_payroll::models::{DayId, EvaluationDay, ExaminerId, StaffEvaluation, StaffId};
/// use chrono::NaiveDate;
///
/// let day_id = DayId::new();
/// let staff = vec![
///     StaffEvaluation { id: StaffId::new(), day_id, staff_name: "A".into(), papers_evaluated: 12 },
///     StaffEvaluation { id: StaffId::new(), day_id, staff_name: "B".into(), papers_evaluated: 8 },
/// ];
/// let day = EvaluationDay::new(
///     day_id,
///     ExaminerId::new(),
///     NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
///     staff,
/// );
/// assert_eq!(day.total_papers(), 20);
/// assert_eq!(day.staff_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationDay {
    /// Store-assigned identity.
    pub id: DayId,
    /// The examiner owning this day.
    pub examiner_id: ExaminerId,
    /// The calendar date, unique per examiner.
    pub date: NaiveDate,
    staff: Vec<StaffEvaluation>,
    total_papers: u32,
    staff_count: u32,
}

impl EvaluationDay {
    /// Builds a day from freshly fetched staff rows.
    pub fn new(
        id: DayId,
        examiner_id: ExaminerId,
        date: NaiveDate,
        staff: Vec<StaffEvaluation>,
    ) -> Self {
        let total_papers = staff
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.papers_evaluated));
        let staff_count = u32::try_from(staff.len()).unwrap_or(u32::MAX);
        Self {
            id,
            examiner_id,
            date,
            staff,
            total_papers,
            staff_count,
        }
    }

    /// The staff rows of this day.
    pub fn staff(&self) -> &[StaffEvaluation] {
        &self.staff
    }

    /// Sum of all staff paper counts.
    pub fn total_papers(&self) -> u32 {
        self.total_papers
    }

    /// Number of staff rows.
    pub fn staff_count(&self) -> u32 {
        self.staff_count
    }
}

/// A staff entry submitted for reconciliation.
///
/// `id` is `Some` when the caller intends to keep an existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffEntry {
    /// Prior identity, if the row was already persisted.
    pub id: Option<StaffId>,
    /// Staff display name.
    pub staff_name: String,
    /// Number of papers evaluated.
    pub papers_evaluated: u32,
}

impl From<&StaffEvaluation> for StaffEntry {
    fn from(row: &StaffEvaluation) -> Self {
        StaffEntry {
            id: Some(row.id),
            staff_name: row.staff_name.clone(),
            papers_evaluated: row.papers_evaluated,
        }
    }
}

/// A row shape for a batch upsert keyed by identity.
///
/// Rows without `id` are inserted and receive a store-assigned identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffUpsert {
    /// Identity to update, or `None` to insert.
    pub id: Option<StaffId>,
    /// The owning evaluation day.
    pub day_id: DayId,
    /// Staff display name.
    pub staff_name: String,
    /// Number of papers evaluated.
    pub papers_evaluated: u32,
}

/// A staff member's name and paper count, without identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffPapers {
    /// Staff display name.
    pub name: String,
    /// Number of papers evaluated.
    pub papers: u32,
}

/// How an evaluation day's work is described to the salary calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayBreakdown {
    /// Explicit per-staff rows.
    Staff(Vec<StaffPapers>),
    /// Only aggregate counts are known.
    Aggregate {
        /// Number of staff who contributed.
        staff_count: u32,
        /// Total papers evaluated.
        total_papers: u32,
    },
}

impl DayBreakdown {
    /// Total papers described by this breakdown.
    pub fn total_papers(&self) -> u32 {
        match self {
            DayBreakdown::Staff(staff) => staff
                .iter()
                .fold(0u32, |acc, s| acc.saturating_add(s.papers)),
            DayBreakdown::Aggregate { total_papers, .. } => *total_papers,
        }
    }

    /// Number of staff described by this breakdown.
    pub fn staff_count(&self) -> u32 {
        match self {
            DayBreakdown::Staff(staff) => u32::try_from(staff.len()).unwrap_or(u32::MAX),
            DayBreakdown::Aggregate { staff_count, .. } => *staff_count,
        }
    }
}

/// One evaluation day passed to the salary calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayInput {
    /// Persisted identity; `None` means the day is created just-in-time.
    pub id: Option<DayId>,
    /// The calendar date.
    pub date: NaiveDate,
    /// The day's work.
    pub breakdown: DayBreakdown,
}

impl From<&EvaluationDay> for DayInput {
    fn from(day: &EvaluationDay) -> Self {
        DayInput {
            id: Some(day.id),
            date: day.date,
            breakdown: DayBreakdown::Staff(
                day.staff()
                    .iter()
                    .map(|s| StaffPapers {
                        name: s.staff_name.clone(),
                        papers: s.papers_evaluated,
                    })
                    .collect(),
            ),
        }
    }
}
