//! Staff evaluation reconciliation.
//!
//! This module provides [`StaffEvaluationReconciler`], which makes a day's
//! stored staff rows match a caller-supplied list exactly, using at most one
//! delete batch and one upsert batch.
//!
//! # Rules
//!
//! - A supplied identity is kept only when it names a row of this day.
//!   Missing, foreign or duplicated identities are inserted as new rows.
//! - Stored rows whose identity was not supplied are deleted.
//! - Rows whose name and paper count are unchanged are not written, so
//!   reconciling the returned rows a second time issues no writes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{DayId, StaffEntry, StaffEvaluation, StaffId, StaffUpsert};
use crate::store::EvaluationStore;

/// What a reconciliation changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// The reconciled day.
    pub day_id: DayId,
    /// Identities removed from the day.
    pub deleted: Vec<StaffId>,
    /// Rows inserted.
    pub inserted: usize,
    /// Rows updated in place.
    pub updated: usize,
    /// Rows left untouched.
    pub unchanged: usize,
    /// The day's staff rows after reconciliation, in the caller's order.
    pub staff: Vec<StaffEvaluation>,
}

impl ReconcileOutcome {
    /// Returns true if nothing had to be written.
    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty() && self.inserted == 0 && self.updated == 0
    }

    /// Total papers across the reconciled rows.
    pub fn total_papers(&self) -> u32 {
        self.staff
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.papers_evaluated))
    }
}

/// Where each supplied entry ends up after the plan is applied.
enum Slot {
    Unchanged(StaffEvaluation),
    Written(usize),
}

/// Diffs supplied staff lists against the store.
#[derive(Clone)]
pub struct StaffEvaluationReconciler {
    store: Arc<dyn EvaluationStore>,
}

impl StaffEvaluationReconciler {
    /// Creates a reconciler over the given backend.
    pub fn new(store: Arc<dyn EvaluationStore>) -> Self {
        Self { store }
    }

    /// Reconciles a day's staff rows with `entries`.
    ///
    /// # Errors
    ///
    /// - `Validation` if any entry has a blank name (nothing is written)
    /// - `NotFound` if the day does not exist
    /// - `Persistence` if either batch fails
    pub async fn reconcile(
        &self,
        day_id: DayId,
        entries: &[StaffEntry],
    ) -> EngineResult<ReconcileOutcome> {
        validate_entries(entries)?;

        if self.store.get_day(day_id).await?.is_none() {
            return Err(EngineError::NotFound {
                entity: "EvaluationDay",
                id: day_id.to_string(),
            });
        }

        let existing = self.store.staff_for_day(day_id).await?;
        let existing_by_id: HashMap<StaffId, &StaffEvaluation> =
            existing.iter().map(|s| (s.id, s)).collect();

        let mut provided: HashSet<StaffId> = HashSet::new();
        let mut slots = Vec::with_capacity(entries.len());
        let mut to_upsert = Vec::new();
        let mut inserted = 0;
        let mut updated = 0;

        for entry in entries {
            let kept = match entry.id {
                Some(id) if existing_by_id.contains_key(&id) && provided.insert(id) => Some(id),
                Some(id) => {
                    warn!(
                        day_id = %day_id,
                        staff_id = %id,
                        "Supplied identity is not a distinct row of this day; inserting as new"
                    );
                    None
                }
                None => None,
            };

            match kept.and_then(|id| existing_by_id.get(&id)) {
                Some(current)
                    if current.staff_name == entry.staff_name
                        && current.papers_evaluated == entry.papers_evaluated =>
                {
                    slots.push(Slot::Unchanged((*current).clone()));
                }
                _ => {
                    if kept.is_some() {
                        updated += 1;
                    } else {
                        inserted += 1;
                    }
                    slots.push(Slot::Written(to_upsert.len()));
                    to_upsert.push(StaffUpsert {
                        id: kept,
                        day_id,
                        staff_name: entry.staff_name.clone(),
                        papers_evaluated: entry.papers_evaluated,
                    });
                }
            }
        }

        let to_delete: Vec<StaffId> = existing
            .iter()
            .map(|s| s.id)
            .filter(|id| !provided.contains(id))
            .collect();

        if !to_delete.is_empty() {
            let removed = self.store.delete_staff(&to_delete).await?;
            debug!(day_id = %day_id, removed, "Deleted staff evaluations");
        }

        let written = if to_upsert.is_empty() {
            Vec::new()
        } else {
            self.store.upsert_staff(to_upsert).await?
        };

        let mut staff = Vec::with_capacity(slots.len());
        for slot in slots {
            match slot {
                Slot::Unchanged(row) => staff.push(row),
                Slot::Written(index) => {
                    let row = written.get(index).cloned().ok_or_else(|| {
                        EngineError::Persistence {
                            message: "store returned fewer rows than were upserted".to_string(),
                        }
                    })?;
                    staff.push(row);
                }
            }
        }

        let outcome = ReconcileOutcome {
            day_id,
            unchanged: staff.len() - inserted - updated,
            deleted: to_delete,
            inserted,
            updated,
            staff,
        };

        info!(
            day_id = %day_id,
            deleted = outcome.deleted.len(),
            inserted = outcome.inserted,
            updated = outcome.updated,
            unchanged = outcome.unchanged,
            "Reconciled staff evaluations"
        );

        Ok(outcome)
    }
}

fn validate_entries(entries: &[StaffEntry]) -> EngineResult<()> {
    for (index, entry) in entries.iter().enumerate() {
        if entry.staff_name.trim().is_empty() {
            return Err(EngineError::validation(
                format!("staff[{}].staff_name", index),
                "must be a non-empty name",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Examiner, ExaminerId};
    use crate::store::InMemoryStore;
    use chrono::NaiveDate;

    fn entry(id: Option<StaffId>, name: &str, papers: u32) -> StaffEntry {
        StaffEntry {
            id,
            staff_name: name.to_string(),
            papers_evaluated: papers,
        }
    }

    async fn setup() -> (Arc<InMemoryStore>, StaffEvaluationReconciler, DayId) {
        let examiner = Examiner {
            id: ExaminerId::new(),
            name: "R. Iyer".to_string(),
            examiner_code: "EX-204".to_string(),
            department: None,
        };
        let examiner_id = examiner.id;
        let store = Arc::new(InMemoryStore::with_examiners([examiner]));
        let day = store
            .insert_day(examiner_id, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap())
            .await
            .unwrap();
        let reconciler = StaffEvaluationReconciler::new(store.clone());
        (store, reconciler, day.id)
    }

    #[tokio::test]
    async fn test_new_entries_are_inserted() {
        let (store, reconciler, day_id) = setup().await;

        let outcome = reconciler
            .reconcile(day_id, &[entry(None, "A", 5), entry(None, "B", 7)])
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.updated, 0);
        assert!(outcome.deleted.is_empty());
        assert_eq!(outcome.total_papers(), 12);
        assert_eq!(store.staff_for_day(day_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_drops_missing_and_keeps_supplied_identity() {
        let (store, reconciler, day_id) = setup().await;
        let first = reconciler
            .reconcile(day_id, &[entry(None, "A", 1), entry(None, "B", 2)])
            .await
            .unwrap();
        let a = first.staff[0].id;
        let b = first.staff[1].id;

        let outcome = reconciler
            .reconcile(day_id, &[entry(Some(a), "X", 5)])
            .await
            .unwrap();

        assert_eq!(outcome.deleted, vec![b]);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.inserted, 0);
        let rows = store.staff_for_day(day_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, a);
        assert_eq!(rows[0].staff_name, "X");
        assert_eq!(rows[0].papers_evaluated, 5);
    }

    #[tokio::test]
    async fn test_second_identical_reconcile_issues_no_writes() {
        let (store, reconciler, day_id) = setup().await;
        let first = reconciler
            .reconcile(day_id, &[entry(None, "A", 4), entry(None, "B", 6)])
            .await
            .unwrap();
        let resubmitted: Vec<StaffEntry> = first.staff.iter().map(StaffEntry::from).collect();
        let writes_before = store.write_count();

        let second = reconciler.reconcile(day_id, &resubmitted).await.unwrap();

        assert!(second.is_noop());
        assert_eq!(second.unchanged, 2);
        assert_eq!(store.write_count(), writes_before);
        assert_eq!(second.staff, first.staff);
    }

    #[tokio::test]
    async fn test_foreign_identity_is_inserted_as_new() {
        let (store, reconciler, day_id) = setup().await;
        let foreign = StaffId::new();

        let outcome = reconciler
            .reconcile(day_id, &[entry(Some(foreign), "A", 3)])
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 1);
        let rows = store.staff_for_day(day_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_ne!(rows[0].id, foreign);
    }

    #[tokio::test]
    async fn test_duplicated_identity_keeps_first_only() {
        let (store, reconciler, day_id) = setup().await;
        let first = reconciler
            .reconcile(day_id, &[entry(None, "A", 3)])
            .await
            .unwrap();
        let a = first.staff[0].id;

        let outcome = reconciler
            .reconcile(day_id, &[entry(Some(a), "A", 3), entry(Some(a), "A copy", 2)])
            .await
            .unwrap();

        assert_eq!(outcome.unchanged, 1);
        assert_eq!(outcome.inserted, 1);
        let rows = store.staff_for_day(day_id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(outcome.staff[0].id, a);
        assert_ne!(outcome.staff[1].id, a);
    }

    #[tokio::test]
    async fn test_empty_list_deletes_everything() {
        let (store, reconciler, day_id) = setup().await;
        reconciler
            .reconcile(day_id, &[entry(None, "A", 3), entry(None, "B", 1)])
            .await
            .unwrap();

        let outcome = reconciler.reconcile(day_id, &[]).await.unwrap();

        assert_eq!(outcome.deleted.len(), 2);
        assert!(store.staff_for_day(day_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected_before_any_write() {
        let (store, reconciler, day_id) = setup().await;
        let writes_before = store.write_count();

        let result = reconciler
            .reconcile(day_id, &[entry(None, "A", 3), entry(None, "   ", 1)])
            .await;

        match result {
            Err(EngineError::Validation { field, .. }) => {
                assert_eq!(field, "staff[1].staff_name")
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
        assert_eq!(store.write_count(), writes_before);
    }

    #[tokio::test]
    async fn test_unknown_day_is_not_found() {
        let (_, reconciler, _) = setup().await;
        let result = reconciler
            .reconcile(DayId::new(), &[entry(None, "A", 1)])
            .await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }
}
