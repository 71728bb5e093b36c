//! Request types for the payroll engine API.
//!
//! Incoming payloads are loosely typed: paper counts may arrive as numbers
//! or numeric strings and staff identities may be empty strings. Fields that
//! need that tolerance are captured as raw JSON values and converted to
//! domain types through [`crate::models::coerce`].

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::calculation::SalaryRequest;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CalculationRecord, DayBreakdown, DayId, DayInput, ExaminerId, StaffEntry, StaffPapers, coerce,
};

/// Body of `POST /examiners/:examiner_id/days`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDayRequest {
    /// The evaluation date.
    pub date: NaiveDate,
}

/// One staff row in a reconcile or calculate payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffEntryRequest {
    /// Prior identity; empty or unparseable values mean "new row".
    #[serde(default)]
    pub id: Option<Value>,
    /// Staff display name.
    #[serde(default, alias = "staff_name", alias = "name")]
    pub staff_name: Option<Value>,
    /// Papers evaluated.
    #[serde(default, alias = "papers_evaluated", alias = "papers")]
    pub papers_evaluated: Option<Value>,
}

impl StaffEntryRequest {
    /// Validates the row at `index` of a staff list.
    pub fn into_entry(self, index: usize) -> EngineResult<StaffEntry> {
        let staff_name =
            coerce::staff_name(&format!("staff[{}].staff_name", index), self.staff_name.as_ref())?;
        let papers_evaluated = coerce::papers(
            &format!("staff[{}].papers_evaluated", index),
            self.papers_evaluated.as_ref(),
        )?;
        Ok(StaffEntry {
            id: self.id.as_ref().and_then(coerce::identity),
            staff_name,
            papers_evaluated,
        })
    }
}

/// Converts a whole reconcile payload, failing on the first invalid row.
pub fn staff_entries(rows: Vec<StaffEntryRequest>) -> EngineResult<Vec<StaffEntry>> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| row.into_entry(index))
        .collect()
}

/// One evaluation day in a calculate payload.
///
/// Either `staff` or the `staffCount`/`totalPapers` aggregates describe the
/// day's work; a non-empty `staff` list wins.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayInputRequest {
    /// Persisted day identity, if the day already exists.
    #[serde(default)]
    pub id: Option<Value>,
    /// Evaluation date.
    #[serde(default)]
    pub date: Value,
    /// Explicit staff rows.
    #[serde(default)]
    pub staff: Vec<StaffEntryRequest>,
    /// Aggregate staff count.
    #[serde(default, alias = "staff_count")]
    pub staff_count: Option<Value>,
    /// Aggregate paper count.
    #[serde(default, alias = "total_papers")]
    pub total_papers: Option<Value>,
}

impl DayInputRequest {
    /// Validates the day at `index` of a calculate payload.
    pub fn into_input(self, index: usize) -> EngineResult<DayInput> {
        let date = coerce::date(&self.date).ok_or_else(|| {
            EngineError::validation(
                format!("days[{}].date", index),
                format!("must be a YYYY-MM-DD date, got {}", self.date),
            )
        })?;

        let breakdown = if self.staff.is_empty() {
            DayBreakdown::Aggregate {
                staff_count: coerce::papers(
                    &format!("days[{}].staff_count", index),
                    self.staff_count.as_ref(),
                )?,
                total_papers: coerce::papers(
                    &format!("days[{}].total_papers", index),
                    self.total_papers.as_ref(),
                )?,
            }
        } else {
            let staff = self
                .staff
                .into_iter()
                .enumerate()
                .map(|(i, row)| {
                    let entry = row.into_entry(i).map_err(|e| nest_field(index, e))?;
                    Ok(StaffPapers {
                        name: entry.staff_name,
                        papers: entry.papers_evaluated,
                    })
                })
                .collect::<EngineResult<Vec<_>>>()?;
            DayBreakdown::Staff(staff)
        };

        Ok(DayInput {
            id: self.id.as_ref().and_then(coerce::identity::<DayId>),
            date,
            breakdown,
        })
    }
}

fn nest_field(day_index: usize, error: EngineError) -> EngineError {
    match error {
        EngineError::Validation { field, message } => EngineError::Validation {
            field: format!("days[{}].{}", day_index, field),
            message,
        },
        other => other,
    }
}

/// Body of `POST /calculations`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    /// The examiner being paid.
    #[serde(alias = "examiner_id")]
    pub examiner_id: ExaminerId,
    /// The contributing days.
    #[serde(default, alias = "evaluationDays", alias = "evaluation_days")]
    pub days: Vec<DayInputRequest>,
}

impl CalculateRequest {
    /// Validates the payload into a calculator request.
    pub fn into_salary_request(self) -> EngineResult<SalaryRequest> {
        let days = self
            .days
            .into_iter()
            .enumerate()
            .map(|(index, day)| day.into_input(index))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(SalaryRequest {
            examiner_id: self.examiner_id,
            days,
        })
    }
}

/// Body of `POST /reports`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    /// Calculations to load from the store.
    #[serde(default, alias = "calculation_ids")]
    pub calculation_ids: Vec<String>,
    /// Records supplied inline, in any of the accepted breakdown shapes.
    #[serde(default)]
    pub records: Vec<CalculationRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_staff_entry_coerces_string_papers() {
        let row: StaffEntryRequest =
            serde_json::from_value(json!({"id": "", "staffName": " A ", "papersEvaluated": "12"}))
                .unwrap();

        let entry = row.into_entry(0).unwrap();

        assert_eq!(entry.id, None);
        assert_eq!(entry.staff_name, "A");
        assert_eq!(entry.papers_evaluated, 12);
    }

    #[test]
    fn test_staff_entry_rejects_negative_papers() {
        let row: StaffEntryRequest =
            serde_json::from_value(json!({"staffName": "A", "papersEvaluated": -3})).unwrap();

        match row.into_entry(2) {
            Err(EngineError::Validation { field, .. }) => {
                assert_eq!(field, "staff[2].papers_evaluated")
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_papers_default_to_zero() {
        let entries = staff_entries(vec![StaffEntryRequest {
            staff_name: Some(json!("B")),
            ..Default::default()
        }])
        .unwrap();
        assert_eq!(entries[0].papers_evaluated, 0);
    }

    #[test]
    fn test_day_with_staff_becomes_explicit_breakdown() {
        let day: DayInputRequest = serde_json::from_value(json!({
            "date": "2025-03-14",
            "staff": [{"name": "A", "papers": 4}, {"name": "B", "papers": "6"}],
            "totalPapers": 999
        }))
        .unwrap();

        let input = day.into_input(0).unwrap();

        assert_eq!(input.id, None);
        assert_eq!(input.breakdown.total_papers(), 10);
        assert_eq!(input.breakdown.staff_count(), 2);
    }

    #[test]
    fn test_day_without_staff_uses_aggregates() {
        let day_id = DayId::new();
        let day: DayInputRequest = serde_json::from_value(json!({
            "id": day_id.to_string(),
            "date": "2025-03-14T00:00:00Z",
            "staffCount": "3",
            "totalPapers": 10
        }))
        .unwrap();

        let input = day.into_input(0).unwrap();

        assert_eq!(input.id, Some(day_id));
        assert_eq!(
            input.breakdown,
            DayBreakdown::Aggregate {
                staff_count: 3,
                total_papers: 10
            }
        );
    }

    #[test]
    fn test_bad_date_is_validation_error() {
        let day: DayInputRequest =
            serde_json::from_value(json!({"date": "14/03/2025", "totalPapers": 1})).unwrap();

        match day.into_input(1) {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "days[1].date"),
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_staff_name_in_day_names_nested_field() {
        let request: CalculateRequest = serde_json::from_value(json!({
            "examinerId": ExaminerId::new().to_string(),
            "days": [{"date": "2025-03-14", "staff": [{"name": "  ", "papers": 1}]}]
        }))
        .unwrap();

        match request.into_salary_request() {
            Err(EngineError::Validation { field, .. }) => {
                assert_eq!(field, "days[0].staff[0].staff_name")
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
    }
}
