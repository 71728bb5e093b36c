//! Calculation persistence.
//!
//! Calculations are insert-only. Reading one back joins its linked days and
//! their staff rows; when linked days exist, their fresh sums take
//! precedence over the totals stored on the calculation row.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::evaluation::EvaluationDayStore;
use crate::models::{
    Calculation, CalculationDayLink, CalculationDetail, CalculationId, CalculationRecord, DayId,
    Examiner, ExaminerId, LinkedDay, NestedDay, NewCalculation, StaffRecord,
};
use crate::store::EvaluationStore;

/// Saves calculations and links them to their evaluation days.
#[derive(Clone)]
pub struct CalculationRepository {
    store: Arc<dyn EvaluationStore>,
    days: EvaluationDayStore,
}

impl CalculationRepository {
    /// Creates a repository over the given backend.
    pub fn new(store: Arc<dyn EvaluationStore>) -> Self {
        let days = EvaluationDayStore::new(store.clone());
        Self { store, days }
    }

    /// Inserts a calculation row.
    pub async fn save(&self, calculation: NewCalculation) -> EngineResult<Calculation> {
        let saved = self.store.insert_calculation(calculation).await?;
        info!(
            calculation_id = %saved.id,
            examiner_id = %saved.examiner_id,
            total_papers = saved.total_papers,
            final_amount = %saved.amounts.final_amount,
            "Saved calculation"
        );
        Ok(saved)
    }

    /// Links a calculation to the given days in one batch.
    ///
    /// Entries without an identity are skipped; if none remain, nothing is
    /// written. Returns the number of links inserted.
    pub async fn link_days(
        &self,
        calculation_id: CalculationId,
        day_ids: &[Option<DayId>],
    ) -> EngineResult<usize> {
        let links: Vec<CalculationDayLink> = day_ids
            .iter()
            .flatten()
            .map(|&day_id| CalculationDayLink {
                calculation_id,
                day_id,
            })
            .collect();

        let skipped = day_ids.len() - links.len();
        if skipped > 0 {
            debug!(
                calculation_id = %calculation_id,
                skipped,
                "Skipping day entries without identity"
            );
        }
        if links.is_empty() {
            return Ok(0);
        }
        Ok(self.store.insert_links(links).await?)
    }

    /// Loads a calculation with its linked days and their staff rows.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the calculation does not exist
    /// - `Persistence` if the store fails
    pub async fn get_by_id(&self, id: CalculationId) -> EngineResult<CalculationDetail> {
        let mut calculation =
            self.store
                .get_calculation(id)
                .await?
                .ok_or_else(|| EngineError::NotFound {
                    entity: "Calculation",
                    id: id.to_string(),
                })?;

        let mut days = Vec::new();
        for day_id in self.store.linked_day_ids(id).await? {
            match self.store.get_day(day_id).await? {
                Some(row) => days.push(self.days.attach_staff(row).await?),
                None => warn!(
                    calculation_id = %id,
                    day_id = %day_id,
                    "Linked evaluation day no longer exists"
                ),
            }
        }
        days.sort_by_key(|day| day.date);

        if !days.is_empty() {
            let papers = days
                .iter()
                .fold(0u32, |acc, d| acc.saturating_add(d.total_papers()));
            let staff = days
                .iter()
                .fold(0u32, |acc, d| acc.saturating_add(d.staff_count()));
            if papers != calculation.total_papers || staff != calculation.total_staff {
                warn!(
                    calculation_id = %id,
                    stored_papers = calculation.total_papers,
                    fresh_papers = papers,
                    stored_staff = calculation.total_staff,
                    fresh_staff = staff,
                    "Stored totals disagree with linked days; using linked days"
                );
                calculation.total_papers = papers;
                calculation.total_staff = staff;
            }
        }

        Ok(CalculationDetail { calculation, days })
    }

    /// Lists an examiner's calculations ordered by creation time.
    pub async fn list_for_examiner(&self, examiner_id: ExaminerId) -> EngineResult<Vec<Calculation>> {
        Ok(self.store.list_calculations(examiner_id).await?)
    }

    /// Loads a calculation in the shape the report aggregator consumes.
    pub async fn load_record(&self, id: CalculationId) -> EngineResult<CalculationRecord> {
        let detail = self.get_by_id(id).await?;
        let examiner_id = detail.calculation.examiner_id;
        let examiner =
            self.store
                .get_examiner(examiner_id)
                .await?
                .ok_or_else(|| EngineError::NotFound {
                    entity: "Examiner",
                    id: examiner_id.to_string(),
                })?;
        Ok(to_record(detail, examiner))
    }
}

/// Converts a loaded calculation into report input with a nested breakdown.
pub fn to_record(detail: CalculationDetail, examiner: Examiner) -> CalculationRecord {
    let CalculationDetail { calculation, days } = detail;
    let calculation_days = days
        .iter()
        .map(|day| LinkedDay {
            evaluation_day: Some(NestedDay {
                id: Some(day.id),
                date: Some(day.date),
                staff_evaluations: day
                    .staff()
                    .iter()
                    .map(|s| StaffRecord {
                        staff_name: s.staff_name.clone(),
                        papers_evaluated: s.papers_evaluated,
                    })
                    .collect(),
            }),
        })
        .collect();

    CalculationRecord {
        id: calculation.id,
        examiner,
        created_at: calculation.created_at,
        total_papers: calculation.total_papers,
        staff_count: None,
        total_staff: Some(calculation.total_staff),
        base_amount: calculation.amounts.base_amount,
        incentive_amount: calculation.amounts.incentive_amount,
        final_amount: calculation.amounts.final_amount,
        calculation_days,
        evaluation_days: Vec::new(),
    }
}
