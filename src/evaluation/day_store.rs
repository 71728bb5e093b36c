//! Evaluation day storage.
//!
//! This module provides [`EvaluationDayStore`], which creates, loads and
//! deletes evaluation days and always attaches freshly fetched staff rows
//! so that a day's totals are derived rather than cached.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{DayId, EvaluationDay, ExaminerId};
use crate::store::{DayRow, EvaluationStore};

/// CRUD operations for evaluation days.
#[derive(Clone)]
pub struct EvaluationDayStore {
    store: Arc<dyn EvaluationStore>,
}

impl EvaluationDayStore {
    /// Creates a day store over the given backend.
    pub fn new(store: Arc<dyn EvaluationStore>) -> Self {
        Self { store }
    }

    /// Creates an empty evaluation day for an examiner.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the examiner does not exist
    /// - `Conflict` if the examiner already has a day on `date`, whether
    ///   caught by the pre-check or by the store's uniqueness constraint
    /// - `Persistence` if the store fails
    pub async fn create_day(
        &self,
        examiner_id: ExaminerId,
        date: NaiveDate,
    ) -> EngineResult<EvaluationDay> {
        if self.store.get_examiner(examiner_id).await?.is_none() {
            return Err(EngineError::NotFound {
                entity: "Examiner",
                id: examiner_id.to_string(),
            });
        }

        if let Some(existing) = self.store.find_day(examiner_id, date).await? {
            warn!(
                examiner_id = %examiner_id,
                date = %date,
                existing_day_id = %existing.id,
                "Evaluation day already exists"
            );
            return Err(EngineError::Conflict {
                examiner_id: examiner_id.to_string(),
                date,
            });
        }

        let row = self.store.insert_day(examiner_id, date).await?;
        info!(
            examiner_id = %examiner_id,
            day_id = %row.id,
            date = %date,
            "Created evaluation day"
        );
        Ok(EvaluationDay::new(row.id, row.examiner_id, row.date, vec![]))
    }

    /// Loads a day with its staff rows attached.
    pub async fn get_day_with_staff(&self, day_id: DayId) -> EngineResult<EvaluationDay> {
        let row = self
            .store
            .get_day(day_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                entity: "EvaluationDay",
                id: day_id.to_string(),
            })?;
        self.attach_staff(row).await
    }

    /// Finds the day an examiner recorded on `date`, if any.
    pub async fn find_day(
        &self,
        examiner_id: ExaminerId,
        date: NaiveDate,
    ) -> EngineResult<Option<EvaluationDay>> {
        match self.store.find_day(examiner_id, date).await? {
            Some(row) => Ok(Some(self.attach_staff(row).await?)),
            None => Ok(None),
        }
    }

    /// Lists all of an examiner's days, ordered by date.
    pub async fn list_days(&self, examiner_id: ExaminerId) -> EngineResult<Vec<EvaluationDay>> {
        let rows = self.store.list_days(examiner_id).await?;
        let mut days = Vec::with_capacity(rows.len());
        for row in rows {
            days.push(self.attach_staff(row).await?);
        }
        Ok(days)
    }

    /// Deletes a day. Its staff rows go with it (cascade in the store).
    pub async fn delete_day(&self, day_id: DayId) -> EngineResult<()> {
        if !self.store.delete_day(day_id).await? {
            return Err(EngineError::NotFound {
                entity: "EvaluationDay",
                id: day_id.to_string(),
            });
        }
        info!(day_id = %day_id, "Deleted evaluation day");
        Ok(())
    }

    pub(crate) async fn attach_staff(&self, row: DayRow) -> EngineResult<EvaluationDay> {
        let staff = self.store.staff_for_day(row.id).await?;
        Ok(EvaluationDay::new(row.id, row.examiner_id, row.date, staff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Examiner, StaffUpsert};
    use crate::store::InMemoryStore;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn setup() -> (Arc<InMemoryStore>, EvaluationDayStore, ExaminerId) {
        let examiner = Examiner {
            id: ExaminerId::new(),
            name: "R. Iyer".to_string(),
            examiner_code: "EX-204".to_string(),
            department: Some("Physics".to_string()),
        };
        let examiner_id = examiner.id;
        let store = Arc::new(InMemoryStore::with_examiners([examiner]));
        let days = EvaluationDayStore::new(store.clone());
        (store, days, examiner_id)
    }

    #[tokio::test]
    async fn test_create_day_returns_empty_day() {
        let (_, days, examiner_id) = setup();

        let day = days.create_day(examiner_id, date(14)).await.unwrap();

        assert_eq!(day.examiner_id, examiner_id);
        assert_eq!(day.date, date(14));
        assert_eq!(day.staff_count(), 0);
        assert_eq!(day.total_papers(), 0);
    }

    #[tokio::test]
    async fn test_create_duplicate_day_is_conflict() {
        let (_, days, examiner_id) = setup();
        days.create_day(examiner_id, date(14)).await.unwrap();

        let result = days.create_day(examiner_id, date(14)).await;

        match result {
            Err(EngineError::Conflict { date: d, .. }) => assert_eq!(d, date(14)),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_day_for_unknown_examiner_is_not_found() {
        let (_, days, _) = setup();
        let result = days.create_day(ExaminerId::new(), date(14)).await;
        assert!(matches!(
            result,
            Err(EngineError::NotFound {
                entity: "Examiner",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_get_day_with_staff_sums_fetched_rows() {
        let (store, days, examiner_id) = setup();
        let day = days.create_day(examiner_id, date(14)).await.unwrap();
        store
            .upsert_staff(vec![
                StaffUpsert {
                    id: None,
                    day_id: day.id,
                    staff_name: "A".to_string(),
                    papers_evaluated: 12,
                },
                StaffUpsert {
                    id: None,
                    day_id: day.id,
                    staff_name: "B".to_string(),
                    papers_evaluated: 9,
                },
            ])
            .await
            .unwrap();

        let loaded = days.get_day_with_staff(day.id).await.unwrap();

        assert_eq!(loaded.staff_count(), 2);
        assert_eq!(loaded.total_papers(), 21);
    }

    #[tokio::test]
    async fn test_get_missing_day_is_not_found() {
        let (_, days, _) = setup();
        let result = days.get_day_with_staff(DayId::new()).await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_day_removes_it() {
        let (_, days, examiner_id) = setup();
        let day = days.create_day(examiner_id, date(14)).await.unwrap();

        days.delete_day(day.id).await.unwrap();

        assert!(days.get_day_with_staff(day.id).await.is_err());
        assert!(days.delete_day(day.id).await.is_err());
    }

    #[tokio::test]
    async fn test_list_days_ordered_by_date() {
        let (_, days, examiner_id) = setup();
        days.create_day(examiner_id, date(20)).await.unwrap();
        days.create_day(examiner_id, date(3)).await.unwrap();
        days.create_day(examiner_id, date(11)).await.unwrap();

        let listed = days.list_days(examiner_id).await.unwrap();
        let dates: Vec<NaiveDate> = listed.iter().map(|d| d.date).collect();

        assert_eq!(dates, vec![date(3), date(11), date(20)]);
    }

    #[tokio::test]
    async fn test_store_outage_is_persistence_error() {
        let (store, days, examiner_id) = setup();
        store.set_unavailable(true);

        let result = days.create_day(examiner_id, date(14)).await;

        assert!(matches!(result, Err(EngineError::Persistence { .. })));
    }
}
