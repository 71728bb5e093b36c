//! Per-session computation guard.
//!
//! A [`CalculationSession`] moves through `Idle → Computing → Computed`.
//! Only one computation may be in flight per session; a second attempt is
//! rejected with [`EngineError::CalculationInProgress`]. A computation that
//! ends without calling [`ComputationGuard::complete`] (error or panic)
//! returns the session to `Idle` when its guard is dropped.
//!
//! [`SessionRegistry`] keys sessions by caller-supplied id. Callers hold a
//! [`SessionLease`] while they compute; the last lease to go away removes an
//! idle session from the registry, so it only holds sessions in use.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::salary::SalaryOutcome;

/// Where a session is in its computation lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No computation has run, or the last one failed.
    #[default]
    Idle,
    /// A computation is in flight.
    Computing,
    /// The last computation succeeded.
    Computed(SalaryOutcome),
}

/// Re-entrancy guard for one caller session.
#[derive(Debug, Default)]
pub struct CalculationSession {
    state: Mutex<SessionState>,
}

impl CalculationSession {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.lock().clone()
    }

    /// Returns true while a computation is in flight.
    pub fn is_computing(&self) -> bool {
        matches!(*self.lock(), SessionState::Computing)
    }

    /// Enters `Computing`, or fails if a computation is already in flight.
    pub fn try_begin(&self) -> EngineResult<ComputationGuard<'_>> {
        let mut state = self.lock();
        if matches!(*state, SessionState::Computing) {
            return Err(EngineError::CalculationInProgress);
        }
        *state = SessionState::Computing;
        Ok(ComputationGuard {
            session: self,
            finished: false,
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds a session in `Computing` until completed or dropped.
#[derive(Debug)]
pub struct ComputationGuard<'a> {
    session: &'a CalculationSession,
    finished: bool,
}

impl ComputationGuard<'_> {
    /// Records a successful outcome and moves the session to `Computed`.
    pub fn complete(mut self, outcome: SalaryOutcome) {
        *self.session.lock() = SessionState::Computed(outcome);
        self.finished = true;
    }
}

impl Drop for ComputationGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.session.lock() = SessionState::Idle;
        }
    }
}

/// Sessions keyed by caller-supplied session id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<CalculationSession>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `id`, creating it on first use.
    ///
    /// The session stays registered while the returned handle or any lease
    /// on it is alive.
    pub fn session(&self, id: &str) -> Arc<CalculationSession> {
        self.lock()
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(session_id = %id, "Opening calculation session");
                Arc::new(CalculationSession::new())
            })
            .clone()
    }

    /// Borrows the session for `id` until the lease is dropped.
    pub fn lease(&self, id: &str) -> SessionLease<'_> {
        SessionLease {
            registry: self,
            id: id.to_string(),
            session: self.session(id),
        }
    }

    /// Number of known sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no session is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops `id` from the registry once `held` is its only outside handle
    /// and no computation is in flight.
    fn release(&self, id: &str, held: &Arc<CalculationSession>) {
        let mut sessions = self.lock();
        let unused = sessions.get(id).is_some_and(|current| {
            Arc::ptr_eq(current, held) && Arc::strong_count(current) == 2 && !current.is_computing()
        });
        if unused {
            sessions.remove(id);
            debug!(session_id = %id, "Closing calculation session");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<CalculationSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A registered session held for the duration of one request.
#[derive(Debug)]
pub struct SessionLease<'a> {
    registry: &'a SessionRegistry,
    id: String,
    session: Arc<CalculationSession>,
}

impl Deref for SessionLease<'_> {
    type Target = CalculationSession;

    fn deref(&self) -> &CalculationSession {
        &self.session
    }
}

impl Drop for SessionLease<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.id, &self.session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalculationId, ExaminerId, SalaryAmounts};

    fn outcome() -> SalaryOutcome {
        SalaryOutcome {
            calculation_id: CalculationId::new(),
            examiner_id: ExaminerId::new(),
            total_papers: 10,
            total_staff: 2,
            amounts: SalaryAmounts::ZERO,
            calculated_locally: true,
            dropped_days: 0,
        }
    }

    #[test]
    fn test_second_begin_is_rejected_while_computing() {
        let session = CalculationSession::new();
        let _guard = session.try_begin().unwrap();

        assert!(session.is_computing());
        assert!(matches!(
            session.try_begin(),
            Err(EngineError::CalculationInProgress)
        ));
    }

    #[test]
    fn test_dropped_guard_returns_to_idle() {
        let session = CalculationSession::new();
        {
            let _guard = session.try_begin().unwrap();
        }
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.try_begin().is_ok());
    }

    #[test]
    fn test_complete_records_outcome() {
        let session = CalculationSession::new();
        let result = outcome();

        session.try_begin().unwrap().complete(result.clone());

        assert_eq!(session.state(), SessionState::Computed(result));
        assert!(session.try_begin().is_ok());
    }

    #[test]
    fn test_registry_reuses_sessions() {
        let registry = SessionRegistry::new();
        let first = registry.session("abc");
        let again = registry.session("abc");
        let other = registry.session("xyz");

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_released_leases_leave_registry_empty() {
        let registry = SessionRegistry::new();

        for i in 0..1_000 {
            let lease = registry.lease(&format!("client-{}", i));
            lease.try_begin().unwrap().complete(outcome());
        }

        assert!(registry.is_empty());
    }

    #[test]
    fn test_lease_keeps_session_while_shared() {
        let registry = SessionRegistry::new();
        let held = registry.session("desk-1");
        {
            let lease = registry.lease("desk-1");
            assert!(Arc::ptr_eq(&held, &lease.session));
        }
        assert_eq!(registry.len(), 1);

        drop(held);
        drop(registry.lease("desk-1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_overlapping_leases_share_one_session() {
        let registry = SessionRegistry::new();
        let first = registry.lease("desk-2");
        let _guard = first.try_begin().unwrap();

        let second = registry.lease("desk-2");
        assert!(matches!(
            second.try_begin(),
            Err(EngineError::CalculationInProgress)
        ));
        drop(second);
        assert_eq!(registry.len(), 1);
    }
}
