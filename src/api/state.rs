//! Application state for the payroll engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use tracing::info;

use crate::calculation::{
    CalculationRepository, HttpRemoteCalculator, RemoteCalculator, SalaryCalculator,
    SessionRegistry,
};
use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::evaluation::{EvaluationDayStore, StaffEvaluationReconciler};
use crate::report::ReportAggregator;
use crate::store::EvaluationStore;

/// Shared application state.
///
/// Holds the loaded configuration and the engine components, all built over
/// one store.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    days: EvaluationDayStore,
    reconciler: StaffEvaluationReconciler,
    calculator: SalaryCalculator,
    repository: CalculationRepository,
    aggregator: ReportAggregator,
    sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Creates the application state.
    ///
    /// When the remote service is enabled in `service.yaml`, an HTTP client
    /// for it is attached to the salary calculator.
    pub fn new(config: ConfigLoader, store: Arc<dyn EvaluationStore>) -> EngineResult<Self> {
        let remote_config = config.service().remote.clone();
        let mut calculator = SalaryCalculator::new(store.clone(), config.rates().clone());
        if remote_config.enabled {
            let client = HttpRemoteCalculator::new(&remote_config.base_url, remote_config.timeout())
                .map_err(|e| EngineError::ConfigParseError {
                    path: "service.yaml".to_string(),
                    message: format!("cannot build remote client: {}", e),
                })?;
            info!(
                base_url = %remote_config.base_url,
                timeout_ms = remote_config.timeout_ms,
                "Remote salary calculation enabled"
            );
            calculator = calculator.with_remote(Arc::new(client), remote_config.timeout());
        }

        Ok(Self {
            aggregator: ReportAggregator::from(&config.service().report),
            days: EvaluationDayStore::new(store.clone()),
            reconciler: StaffEvaluationReconciler::new(store.clone()),
            repository: CalculationRepository::new(store),
            calculator,
            config: Arc::new(config),
            sessions: Arc::new(SessionRegistry::new()),
        })
    }

    /// Replaces the remote calculator, keeping the configured timeout.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteCalculator>) -> Self {
        let timeout = self.config.service().remote.timeout();
        self.calculator = self.calculator.with_remote(remote, timeout);
        self
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Evaluation day operations.
    pub fn days(&self) -> &EvaluationDayStore {
        &self.days
    }

    /// Staff reconciliation.
    pub fn reconciler(&self) -> &StaffEvaluationReconciler {
        &self.reconciler
    }

    /// Salary computation.
    pub fn calculator(&self) -> &SalaryCalculator {
        &self.calculator
    }

    /// Calculation reads.
    pub fn repository(&self) -> &CalculationRepository {
        &self.repository
    }

    /// Report aggregation.
    pub fn aggregator(&self) -> &ReportAggregator {
        &self.aggregator
    }

    /// Per-session calculation guards.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}
