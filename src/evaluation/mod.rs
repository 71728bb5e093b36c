//! Evaluation data entry.
//!
//! This module contains the evaluation day store and the staff evaluation
//! reconciler used when an examiner's day is recorded or edited.

mod day_store;
mod reconciler;

pub use day_store::EvaluationDayStore;
pub use reconciler::{ReconcileOutcome, StaffEvaluationReconciler};
