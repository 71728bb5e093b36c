//! Report input and output models.
//!
//! [`CalculationRecord`] is what the report aggregator consumes: a
//! calculation as it comes back from the store, possibly carrying its day
//! breakdown in one of several historical shapes. Numeric fields go through
//! the lenient adapters in [`super::coerce`].
//!
//! [`Report`] and its nested nodes are what the aggregator produces.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::coerce;
use super::{CalculationId, DayId, Examiner, ExaminerId};

/// A calculation with whatever breakdown data is attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    /// Calculation identity.
    pub id: CalculationId,
    /// The examiner the calculation belongs to.
    pub examiner: Examiner,
    /// When the calculation was persisted.
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Aggregate paper count.
    #[serde(default, alias = "totalPapers", deserialize_with = "coerce::lenient_count")]
    pub total_papers: u32,
    /// Aggregate staff count, under its older field name.
    #[serde(default, alias = "staffCount", deserialize_with = "coerce::lenient_opt_count")]
    pub staff_count: Option<u32>,
    /// Aggregate staff count.
    #[serde(default, alias = "totalStaff", deserialize_with = "coerce::lenient_opt_count")]
    pub total_staff: Option<u32>,
    /// Base amount.
    #[serde(default, alias = "baseAmount", deserialize_with = "coerce::lenient_decimal")]
    pub base_amount: Decimal,
    /// Incentive amount.
    #[serde(default, alias = "incentiveAmount", deserialize_with = "coerce::lenient_decimal")]
    pub incentive_amount: Decimal,
    /// Final amount.
    #[serde(default, alias = "finalAmount", deserialize_with = "coerce::lenient_decimal")]
    pub final_amount: Decimal,
    /// Fully nested breakdown: link rows, each carrying a day with staff rows.
    #[serde(default, alias = "calculationDays")]
    pub calculation_days: Vec<LinkedDay>,
    /// Legacy flat day list with inline staff arrays.
    #[serde(default, alias = "evaluationDays")]
    pub evaluation_days: Vec<LegacyDay>,
}

impl CalculationRecord {
    /// The aggregate staff count, whichever field carried it.
    pub fn aggregate_staff(&self) -> u32 {
        self.total_staff.or(self.staff_count).unwrap_or(0)
    }
}

/// A link row of the nested breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedDay {
    /// The linked evaluation day, if the join produced one.
    #[serde(default, alias = "evaluationDay")]
    pub evaluation_day: Option<NestedDay>,
}

/// An evaluation day inside the nested breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedDay {
    /// Day identity.
    #[serde(default, deserialize_with = "coerce::lenient_id")]
    pub id: Option<DayId>,
    /// Evaluation date.
    #[serde(default, alias = "evaluationDate", deserialize_with = "coerce::lenient_date")]
    pub date: Option<NaiveDate>,
    /// Staff rows.
    #[serde(default, alias = "staffEvaluations")]
    pub staff_evaluations: Vec<StaffRecord>,
}

/// An evaluation day in the legacy flat list.
///
/// The inline staff array has been written under three names over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyDay {
    /// Day identity.
    #[serde(default, deserialize_with = "coerce::lenient_id")]
    pub id: Option<DayId>,
    /// Evaluation date.
    #[serde(default, alias = "evaluationDate", deserialize_with = "coerce::lenient_date")]
    pub date: Option<NaiveDate>,
    /// Inline staff rows.
    #[serde(default, alias = "staff_evaluations", alias = "staffEvaluations")]
    pub staff: Vec<StaffRecord>,
    /// Aggregate papers, when the inline staff list was never captured.
    #[serde(default, alias = "totalPapers", deserialize_with = "coerce::lenient_count")]
    pub total_papers: u32,
    /// Aggregate staff, when the inline staff list was never captured.
    #[serde(default, alias = "staffCount", deserialize_with = "coerce::lenient_count")]
    pub staff_count: u32,
}

/// A staff row inside either breakdown shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffRecord {
    /// Staff display name.
    #[serde(default, alias = "staffName", alias = "name")]
    pub staff_name: String,
    /// Papers evaluated.
    #[serde(
        default,
        alias = "papersEvaluated",
        alias = "papers",
        deserialize_with = "coerce::lenient_count"
    )]
    pub papers_evaluated: u32,
}

/// Where a calculation's day breakdown in the report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaySource {
    /// Nested link → day → staff rows.
    Nested,
    /// Legacy flat day list.
    Legacy,
    /// Synthesized from aggregate totals.
    Synthetic,
    /// No breakdown could be recovered.
    Empty,
}

/// Running totals at one level of the report tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollup {
    /// Distinct examiners.
    pub examiner_count: u32,
    /// Calculations.
    pub calculation_count: u32,
    /// Evaluation days.
    pub day_count: u32,
    /// Papers evaluated.
    pub total_papers: u64,
    /// Staff counted.
    pub total_staff: u64,
    /// Sum of final amounts.
    pub total_amount: Decimal,
}

impl Rollup {
    /// Adds another rollup into this one.
    pub fn absorb(&mut self, other: &Rollup) {
        self.examiner_count += other.examiner_count;
        self.calculation_count += other.calculation_count;
        self.day_count += other.day_count;
        self.total_papers += other.total_papers;
        self.total_staff += other.total_staff;
        self.total_amount += other.total_amount;
    }
}

/// One staff member's line in a report day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffNode {
    /// Staff display name.
    pub name: String,
    /// Papers evaluated.
    pub papers: u32,
}

/// One evaluation day in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayNode {
    /// Day identity, absent for synthesized days.
    pub day_id: Option<DayId>,
    /// Evaluation date.
    pub date: NaiveDate,
    /// Sum of staff papers.
    pub total_papers: u32,
    /// Number of staff lines.
    pub staff_count: u32,
    /// Staff lines.
    pub staff: Vec<StaffNode>,
}

/// One calculation in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationNode {
    /// Calculation identity.
    pub calculation_id: CalculationId,
    /// When the calculation was persisted.
    pub created_at: DateTime<Utc>,
    /// Where the day breakdown came from.
    pub source: DaySource,
    /// Papers evaluated.
    pub total_papers: u32,
    /// Staff counted.
    pub total_staff: u32,
    /// Base amount.
    pub base_amount: Decimal,
    /// Incentive amount.
    pub incentive_amount: Decimal,
    /// Final amount.
    pub final_amount: Decimal,
    /// Evaluation days.
    pub days: Vec<DayNode>,
}

/// One examiner in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExaminerNode {
    /// Examiner identity.
    pub examiner_id: ExaminerId,
    /// Display name.
    pub name: String,
    /// External examiner code.
    pub examiner_code: String,
    /// The examiner's calculations, in input order.
    pub calculations: Vec<CalculationNode>,
    /// Totals over this examiner's calculations.
    pub totals: Rollup,
}

/// All examiners of one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentGroup {
    /// Department name.
    pub name: String,
    /// Examiners in first-appearance order.
    pub examiners: Vec<ExaminerNode>,
    /// Totals over the department.
    pub totals: Rollup,
}

/// The complete report tree handed to a document renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Departments ordered by name.
    pub departments: Vec<DepartmentGroup>,
    /// Grand totals.
    pub totals: Rollup,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn examiner_json() -> serde_json::Value {
        json!({
            "id": ExaminerId::new().to_string(),
            "name": "R. Iyer",
            "examiner_code": "EX-204",
            "department": "Physics"
        })
    }

    #[test]
    fn test_record_accepts_camel_case_and_string_numbers() {
        let json = json!({
            "id": CalculationId::new().to_string(),
            "examiner": examiner_json(),
            "createdAt": "2025-03-20T10:00:00Z",
            "totalPapers": "30",
            "staffCount": 3,
            "baseAmount": "600.00",
            "incentiveAmount": 60,
            "finalAmount": "660.00"
        });
        let record: CalculationRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.total_papers, 30);
        assert_eq!(record.aggregate_staff(), 3);
        assert_eq!(record.base_amount, Decimal::from_str("600.00").unwrap());
        assert_eq!(record.incentive_amount, Decimal::from(60));
        assert!(record.calculation_days.is_empty());
        assert!(record.evaluation_days.is_empty());
    }

    #[test]
    fn test_record_defaults_garbage_numbers_to_zero() {
        let json = json!({
            "id": CalculationId::new().to_string(),
            "examiner": examiner_json(),
            "created_at": "2025-03-20T10:00:00Z",
            "total_papers": "lots",
            "final_amount": null
        });
        let record: CalculationRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.total_papers, 0);
        assert_eq!(record.final_amount, Decimal::ZERO);
        assert_eq!(record.aggregate_staff(), 0);
    }

    #[test]
    fn test_legacy_day_staff_aliases() {
        for key in ["staff", "staff_evaluations", "staffEvaluations"] {
            let json = json!({
                "date": "2025-03-14",
                key: [{"staffName": "A", "papersEvaluated": "5"}]
            });
            let day: LegacyDay = serde_json::from_value(json).unwrap();
            assert_eq!(day.staff.len(), 1, "alias {} not recognised", key);
            assert_eq!(day.staff[0].papers_evaluated, 5);
        }
    }

    #[test]
    fn test_nested_day_with_empty_id_has_no_identity() {
        let json = json!({"id": "", "date": "2025-03-14", "staffEvaluations": []});
        let day: NestedDay = serde_json::from_value(json).unwrap();
        assert!(day.id.is_none());
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2025, 3, 14));
    }

    #[test]
    fn test_rollup_absorb_sums_fields() {
        let mut total = Rollup::default();
        let part = Rollup {
            examiner_count: 1,
            calculation_count: 2,
            day_count: 3,
            total_papers: 40,
            total_staff: 5,
            total_amount: Decimal::from(880),
        };
        total.absorb(&part);
        total.absorb(&part);
        assert_eq!(total.calculation_count, 4);
        assert_eq!(total.total_papers, 80);
        assert_eq!(total.total_amount, Decimal::from(1760));
    }

    #[test]
    fn test_day_source_serialization() {
        assert_eq!(
            serde_json::to_string(&DaySource::Synthetic).unwrap(),
            "\"synthetic\""
        );
    }
}
