//! Calculation models.
//!
//! A [`Calculation`] is the persisted result of one salary computation run.
//! It is never updated: recalculating produces a new row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CalculationId, DayId, EvaluationDay, ExaminerId};

/// Base, incentive and final amounts of a salary computation.
///
/// # Example
///
/// ```
/// use examiner_payroll::models::SalaryAmounts;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let amounts = SalaryAmounts {
///     base_amount: Decimal::from_str("1000.00").unwrap(),
///     incentive_amount: Decimal::from_str("100.00").unwrap(),
///     final_amount: Decimal::from_str("1100.00").unwrap(),
/// };
/// assert!(amounts.is_balanced());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryAmounts {
    /// Papers multiplied by the per-paper rate.
    pub base_amount: Decimal,
    /// Incentive on top of the base amount.
    pub incentive_amount: Decimal,
    /// Base plus incentive.
    pub final_amount: Decimal,
}

impl SalaryAmounts {
    /// All-zero amounts.
    pub const ZERO: SalaryAmounts = SalaryAmounts {
        base_amount: Decimal::ZERO,
        incentive_amount: Decimal::ZERO,
        final_amount: Decimal::ZERO,
    };

    /// Returns true when `final_amount == base_amount + incentive_amount`.
    pub fn is_balanced(&self) -> bool {
        self.final_amount == self.base_amount + self.incentive_amount
    }
}

/// A calculation row ready to be inserted; the store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalculation {
    /// The examiner being paid.
    pub examiner_id: ExaminerId,
    /// Papers across all contributing days.
    pub total_papers: u32,
    /// Staff across all contributing days.
    pub total_staff: u32,
    /// Computed amounts.
    pub amounts: SalaryAmounts,
}

/// A persisted salary computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calculation {
    /// Store-assigned identity.
    pub id: CalculationId,
    /// The examiner being paid.
    pub examiner_id: ExaminerId,
    /// Papers across all contributing days.
    pub total_papers: u32,
    /// Staff across all contributing days.
    pub total_staff: u32,
    /// Computed amounts.
    #[serde(flatten)]
    pub amounts: SalaryAmounts,
    /// When the calculation was persisted.
    pub created_at: DateTime<Utc>,
}

/// Association between a calculation and one contributing evaluation day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalculationDayLink {
    /// The calculation.
    pub calculation_id: CalculationId,
    /// The contributing day.
    pub day_id: DayId,
}

/// A calculation joined with its linked days and their staff rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationDetail {
    /// The calculation, with totals reconciled against the linked days.
    pub calculation: Calculation,
    /// The linked days, ordered by date.
    pub days: Vec<EvaluationDay>,
}
