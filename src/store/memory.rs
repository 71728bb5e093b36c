//! In-memory store backend.
//!
//! Keeps every table behind a single `RwLock` so that each batch call
//! validates its whole input before applying any of it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::models::{
    Calculation, CalculationDayLink, CalculationId, DayId, Examiner, ExaminerId, NewCalculation,
    StaffEvaluation, StaffId, StaffUpsert,
};

use super::{DayRow, EvaluationStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    examiners: HashMap<ExaminerId, Examiner>,
    days: HashMap<DayId, DayRow>,
    staff: Vec<StaffEvaluation>,
    calculations: Vec<Calculation>,
    links: Vec<CalculationDayLink>,
}

/// A store that lives in process memory.
///
/// Besides implementing [`EvaluationStore`], it counts write batches and can
/// be switched into an unavailable state, which tests use to observe how
/// many writes an operation issued and how failures propagate.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with examiners.
    pub fn with_examiners(examiners: impl IntoIterator<Item = Examiner>) -> Self {
        let tables = Tables {
            examiners: examiners.into_iter().map(|e| (e.id, e)).collect(),
            ..Tables::default()
        };
        Self {
            tables: RwLock::new(tables),
            ..Self::default()
        }
    }

    /// Adds or replaces an examiner.
    pub async fn put_examiner(&self, examiner: Examiner) {
        self.tables
            .write()
            .await
            .examiners
            .insert(examiner.id, examiner);
    }

    /// Number of write batches applied so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of calculation rows stored.
    pub async fn calculation_count(&self) -> usize {
        self.tables.read().await.calculations.len()
    }

    /// Makes every subsequent operation fail with [`StoreError::Unavailable`]
    /// until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store switched off".to_string()))
        } else {
            Ok(())
        }
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EvaluationStore for InMemoryStore {
    async fn get_examiner(&self, id: ExaminerId) -> Result<Option<Examiner>, StoreError> {
        self.check_available()?;
        Ok(self.tables.read().await.examiners.get(&id).cloned())
    }

    async fn find_day(
        &self,
        examiner_id: ExaminerId,
        date: NaiveDate,
    ) -> Result<Option<DayRow>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .days
            .values()
            .find(|d| d.examiner_id == examiner_id && d.date == date)
            .copied())
    }

    async fn insert_day(
        &self,
        examiner_id: ExaminerId,
        date: NaiveDate,
    ) -> Result<DayRow, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables
            .days
            .values()
            .any(|d| d.examiner_id == examiner_id && d.date == date)
        {
            return Err(StoreError::UniqueViolation { examiner_id, date });
        }
        let row = DayRow {
            id: DayId::new(),
            examiner_id,
            date,
        };
        tables.days.insert(row.id, row);
        self.record_write();
        Ok(row)
    }

    async fn get_day(&self, id: DayId) -> Result<Option<DayRow>, StoreError> {
        self.check_available()?;
        Ok(self.tables.read().await.days.get(&id).copied())
    }

    async fn list_days(&self, examiner_id: ExaminerId) -> Result<Vec<DayRow>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut days: Vec<DayRow> = tables
            .days
            .values()
            .filter(|d| d.examiner_id == examiner_id)
            .copied()
            .collect();
        days.sort_by_key(|d| d.date);
        Ok(days)
    }

    async fn delete_day(&self, id: DayId) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables.days.remove(&id).is_none() {
            return Ok(false);
        }
        tables.staff.retain(|s| s.day_id != id);
        tables.links.retain(|l| l.day_id != id);
        self.record_write();
        Ok(true)
    }

    async fn staff_for_day(&self, day_id: DayId) -> Result<Vec<StaffEvaluation>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .staff
            .iter()
            .filter(|s| s.day_id == day_id)
            .cloned()
            .collect())
    }

    async fn delete_staff(&self, ids: &[StaffId]) -> Result<usize, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let before = tables.staff.len();
        tables.staff.retain(|s| !ids.contains(&s.id));
        self.record_write();
        Ok(before - tables.staff.len())
    }

    async fn upsert_staff(
        &self,
        rows: Vec<StaffUpsert>,
    ) -> Result<Vec<StaffEvaluation>, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;

        for row in &rows {
            if !tables.days.contains_key(&row.day_id) {
                return Err(StoreError::NotFound {
                    entity: "EvaluationDay",
                    id: row.day_id.to_string(),
                });
            }
            if let Some(id) = row.id {
                if !tables.staff.iter().any(|s| s.id == id) {
                    return Err(StoreError::NotFound {
                        entity: "StaffEvaluation",
                        id: id.to_string(),
                    });
                }
            }
        }

        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let evaluation = StaffEvaluation {
                id: row.id.unwrap_or_default(),
                day_id: row.day_id,
                staff_name: row.staff_name,
                papers_evaluated: row.papers_evaluated,
            };
            match tables.staff.iter_mut().find(|s| s.id == evaluation.id) {
                Some(existing) => *existing = evaluation.clone(),
                None => tables.staff.push(evaluation.clone()),
            }
            stored.push(evaluation);
        }
        self.record_write();
        Ok(stored)
    }

    async fn insert_calculation(
        &self,
        calculation: NewCalculation,
    ) -> Result<Calculation, StoreError> {
        self.check_available()?;
        let row = Calculation {
            id: CalculationId::new(),
            examiner_id: calculation.examiner_id,
            total_papers: calculation.total_papers,
            total_staff: calculation.total_staff,
            amounts: calculation.amounts,
            created_at: Utc::now(),
        };
        self.tables.write().await.calculations.push(row.clone());
        self.record_write();
        Ok(row)
    }

    async fn get_calculation(&self, id: CalculationId) -> Result<Option<Calculation>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.calculations.iter().find(|c| c.id == id).cloned())
    }

    async fn list_calculations(
        &self,
        examiner_id: ExaminerId,
    ) -> Result<Vec<Calculation>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut calculations: Vec<Calculation> = tables
            .calculations
            .iter()
            .filter(|c| c.examiner_id == examiner_id)
            .cloned()
            .collect();
        calculations.sort_by_key(|c| c.created_at);
        Ok(calculations)
    }

    async fn insert_links(&self, links: Vec<CalculationDayLink>) -> Result<usize, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        for link in &links {
            if !tables.calculations.iter().any(|c| c.id == link.calculation_id) {
                return Err(StoreError::NotFound {
                    entity: "Calculation",
                    id: link.calculation_id.to_string(),
                });
            }
            if !tables.days.contains_key(&link.day_id) {
                return Err(StoreError::NotFound {
                    entity: "EvaluationDay",
                    id: link.day_id.to_string(),
                });
            }
        }
        let inserted = links.len();
        tables.links.extend(links);
        self.record_write();
        Ok(inserted)
    }

    async fn linked_day_ids(
        &self,
        calculation_id: CalculationId,
    ) -> Result<Vec<DayId>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .links
            .iter()
            .filter(|l| l.calculation_id == calculation_id)
            .map(|l| l.day_id)
            .collect())
    }
}
