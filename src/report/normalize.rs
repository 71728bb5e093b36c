//! Day breakdown recovery.
//!
//! A calculation record may describe its days in one of three shapes. Each
//! shape has its own adapter below; [`normalize_days`] tries them in
//! priority order and the first that yields a day with staff wins:
//!
//! 1. nested link → day → staff rows
//! 2. the legacy flat day list with inline staff
//! 3. a single synthetic day built from the record's aggregates

use chrono::NaiveDate;

use crate::calculation::synthesize_staff;
use crate::models::{
    CalculationRecord, DayId, DaySource, LegacyDay, LinkedDay, StaffNode, StaffRecord,
};

/// One evaluation day in the common shape the aggregator consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDay {
    /// Day identity, absent for synthesized days.
    pub day_id: Option<DayId>,
    /// Evaluation date.
    pub date: NaiveDate,
    /// Staff lines.
    pub staff: Vec<StaffNode>,
}

impl NormalizedDay {
    /// Sum of staff papers.
    pub fn total_papers(&self) -> u32 {
        self.staff
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.papers))
    }

    /// Number of staff lines.
    pub fn staff_count(&self) -> u32 {
        u32::try_from(self.staff.len()).unwrap_or(u32::MAX)
    }
}

/// Recovers a record's days and reports which shape they came from.
///
/// Days lacking a date fall back to the record's creation date.
pub fn normalize_days(record: &CalculationRecord) -> (DaySource, Vec<NormalizedDay>) {
    let fallback_date = record.created_at.date_naive();

    let nested = from_nested(&record.calculation_days, fallback_date);
    if has_staff(&nested) {
        return (DaySource::Nested, nested);
    }

    let legacy = from_legacy(&record.evaluation_days, fallback_date);
    if has_staff(&legacy) {
        return (DaySource::Legacy, legacy);
    }

    match from_aggregates(record.total_papers, record.aggregate_staff(), fallback_date) {
        Some(day) => (DaySource::Synthetic, vec![day]),
        None => (DaySource::Empty, Vec::new()),
    }
}

fn has_staff(days: &[NormalizedDay]) -> bool {
    days.iter().any(|day| !day.staff.is_empty())
}

fn from_nested(links: &[LinkedDay], fallback_date: NaiveDate) -> Vec<NormalizedDay> {
    links
        .iter()
        .filter_map(|link| link.evaluation_day.as_ref())
        .map(|day| NormalizedDay {
            day_id: day.id,
            date: day.date.unwrap_or(fallback_date),
            staff: staff_nodes(&day.staff_evaluations),
        })
        .collect()
}

fn from_legacy(days: &[LegacyDay], fallback_date: NaiveDate) -> Vec<NormalizedDay> {
    days.iter()
        .map(|day| {
            let staff = if day.staff.is_empty() {
                synthetic_nodes(day.total_papers, day.staff_count)
            } else {
                staff_nodes(&day.staff)
            };
            NormalizedDay {
                day_id: day.id,
                date: day.date.unwrap_or(fallback_date),
                staff,
            }
        })
        .collect()
}

fn from_aggregates(
    total_papers: u32,
    staff_count: u32,
    date: NaiveDate,
) -> Option<NormalizedDay> {
    if total_papers == 0 {
        return None;
    }
    Some(NormalizedDay {
        day_id: None,
        date,
        staff: synthetic_nodes(total_papers, staff_count),
    })
}

fn synthetic_nodes(total_papers: u32, staff_count: u32) -> Vec<StaffNode> {
    synthesize_staff(total_papers, staff_count)
        .into_iter()
        .map(|s| StaffNode {
            name: s.name,
            papers: s.papers,
        })
        .collect()
}

fn staff_nodes(rows: &[StaffRecord]) -> Vec<StaffNode> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let name = row.staff_name.trim();
            StaffNode {
                name: if name.is_empty() {
                    format!("Staff {}", index + 1)
                } else {
                    name.to_string()
                },
                papers: row.papers_evaluated,
            }
        })
        .collect()
}
