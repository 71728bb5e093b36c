//! Salary calculation.
//!
//! [`SalaryCalculator`] turns a set of evaluation days into a persisted
//! calculation. Days submitted without an identity are created first, and
//! every day's staff rows are reconciled onto the store before anything is
//! paid; totals are summed from the stored rows. The remote service is tried
//! when configured; any failure there falls back to the local rate model,
//! which saves the calculation and links its days. Exactly one of the two
//! paths produces the result.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::RateConfig;
use crate::error::{EngineError, EngineResult};
use crate::evaluation::{EvaluationDayStore, StaffEvaluationReconciler};
use crate::models::{
    CalculationId, DayBreakdown, DayId, DayInput, ExaminerId, NewCalculation, SalaryAmounts,
    StaffEntry, StaffEvaluation, StaffPapers,
};
use crate::store::EvaluationStore;

use super::distribution::synthesize_staff;
use super::rates::{amounts_from_base, calculate_amounts};
use super::remote::{
    RemoteCalculation, RemoteCalculator, RemoteDay, RemoteError, RemoteRequest, RemoteStaff,
};
use super::repository::CalculationRepository;
use super::session::CalculationSession;

/// Input to [`SalaryCalculator::calculate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalaryRequest {
    /// The examiner being paid.
    pub examiner_id: ExaminerId,
    /// The contributing days.
    pub days: Vec<DayInput>,
}

/// The result of a salary calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalaryOutcome {
    /// Identity of the persisted calculation.
    pub calculation_id: CalculationId,
    /// The examiner being paid.
    pub examiner_id: ExaminerId,
    /// Papers across all contributing days.
    pub total_papers: u32,
    /// Staff across all contributing days.
    pub total_staff: u32,
    /// Computed amounts.
    #[serde(flatten)]
    pub amounts: SalaryAmounts,
    /// True when the local rate model produced the result.
    pub calculated_locally: bool,
    /// Number of submitted days that could not be used.
    pub dropped_days: usize,
}

/// A day that has a persisted identity and persisted staff rows.
#[derive(Debug, Clone)]
struct PreparedDay {
    id: DayId,
    input: DayInput,
    staff: Vec<StaffPapers>,
}

impl PreparedDay {
    fn total_papers(&self) -> u32 {
        self.staff
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.papers))
    }

    fn staff_count(&self) -> u32 {
        u32::try_from(self.staff.len()).unwrap_or(u32::MAX)
    }
}

/// The staff rows a breakdown describes, synthesizing them for aggregates.
fn breakdown_staff(breakdown: &DayBreakdown) -> Vec<StaffPapers> {
    match breakdown {
        DayBreakdown::Staff(staff) => staff.clone(),
        DayBreakdown::Aggregate {
            staff_count,
            total_papers,
        } => synthesize_staff(*total_papers, *staff_count),
    }
}

fn staff_papers(row: &StaffEvaluation) -> StaffPapers {
    StaffPapers {
        name: row.staff_name.clone(),
        papers: row.papers_evaluated,
    }
}

fn sum_papers(rows: &[StaffEvaluation]) -> u32 {
    rows.iter()
        .fold(0u32, |acc, row| acc.saturating_add(row.papers_evaluated))
}

/// Computes and persists salaries.
#[derive(Clone)]
pub struct SalaryCalculator {
    store: Arc<dyn EvaluationStore>,
    days: EvaluationDayStore,
    reconciler: StaffEvaluationReconciler,
    repository: CalculationRepository,
    rates: RateConfig,
    remote: Option<Arc<dyn RemoteCalculator>>,
    remote_timeout: Duration,
}

impl SalaryCalculator {
    /// Creates a calculator that only uses the local rate model.
    pub fn new(store: Arc<dyn EvaluationStore>, rates: RateConfig) -> Self {
        Self {
            days: EvaluationDayStore::new(store.clone()),
            reconciler: StaffEvaluationReconciler::new(store.clone()),
            repository: CalculationRepository::new(store.clone()),
            store,
            rates,
            remote: None,
            remote_timeout: Duration::from_secs(5),
        }
    }

    /// Tries `remote` first, waiting at most `timeout` for it.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteCalculator>, timeout: Duration) -> Self {
        self.remote = Some(remote);
        self.remote_timeout = timeout;
        self
    }

    /// Returns the rate model.
    pub fn rates(&self) -> &RateConfig {
        &self.rates
    }

    /// Runs one calculation under `session`.
    ///
    /// # Errors
    ///
    /// - `CalculationInProgress` if the session is already computing
    /// - `NoValidInput` if no submitted day could be used
    /// - `Persistence` if the local path could not save the calculation
    pub async fn calculate(
        &self,
        session: &CalculationSession,
        request: SalaryRequest,
    ) -> EngineResult<SalaryOutcome> {
        let guard = session.try_begin()?;
        let outcome = self.compute(request).await?;
        guard.complete(outcome.clone());
        Ok(outcome)
    }

    async fn compute(&self, request: SalaryRequest) -> EngineResult<SalaryOutcome> {
        let examiner_id = request.examiner_id;
        let submitted = request.days.len();
        info!(
            examiner_id = %examiner_id,
            days = submitted,
            "Starting salary calculation"
        );

        let prepared = self.prepare_days(examiner_id, request.days).await?;
        let dropped_days = submitted - prepared.len();
        if prepared.is_empty() {
            return Err(EngineError::NoValidInput {
                message: format!("all {} submitted days were dropped", submitted),
            });
        }

        let total_papers = prepared
            .iter()
            .fold(0u32, |acc, d| acc.saturating_add(d.total_papers()));
        let total_staff = prepared
            .iter()
            .fold(0u32, |acc, d| acc.saturating_add(d.staff_count()));

        if let Some(remote) = &self.remote {
            match self.call_remote(remote.as_ref(), examiner_id, &prepared).await {
                Ok(result) => {
                    let outcome = self.remote_outcome(
                        examiner_id,
                        total_papers,
                        total_staff,
                        dropped_days,
                        result,
                    );
                    info!(
                        examiner_id = %examiner_id,
                        calculation_id = %outcome.calculation_id,
                        final_amount = %outcome.amounts.final_amount,
                        "Remote salary calculation completed"
                    );
                    return Ok(outcome);
                }
                Err(e) => {
                    let err = EngineError::RemoteComputation {
                        message: e.to_string(),
                    };
                    warn!(
                        examiner_id = %examiner_id,
                        error = %err,
                        "Falling back to local salary calculation"
                    );
                }
            }
        }

        self.compute_locally(examiner_id, total_papers, total_staff, dropped_days, &prepared)
            .await
    }

    /// Gives every submitted day a persisted identity and persisted staff
    /// rows, dropping the days that cannot get both.
    async fn prepare_days(
        &self,
        examiner_id: ExaminerId,
        days: Vec<DayInput>,
    ) -> EngineResult<Vec<PreparedDay>> {
        let mut prepared = Vec::with_capacity(days.len());
        for input in days {
            let day = match input.id {
                Some(id) => self.update_day(examiner_id, id, &input).await,
                None => self.create_day(examiner_id, &input).await,
            };
            match day {
                Some((id, staff)) => prepared.push(PreparedDay { id, input, staff }),
                None => warn!(
                    examiner_id = %examiner_id,
                    date = %input.date,
                    "Dropping evaluation day"
                ),
            }
        }
        Ok(prepared)
    }

    async fn update_day(
        &self,
        examiner_id: ExaminerId,
        day_id: DayId,
        input: &DayInput,
    ) -> Option<(DayId, Vec<StaffPapers>)> {
        let id = self.verify_day(examiner_id, day_id).await?;
        let stored = match self.store.staff_for_day(id).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(day_id = %id, error = %e, "Could not load staff for evaluation day");
                return None;
            }
        };

        // Stored rows that already add up to the submitted aggregate are kept.
        if let DayBreakdown::Aggregate {
            staff_count,
            total_papers,
        } = input.breakdown
            && !stored.is_empty()
            && stored.len() == staff_count as usize
            && sum_papers(&stored) == total_papers
        {
            return Some((id, stored.iter().map(staff_papers).collect()));
        }

        match self.record_staff(id, &breakdown_staff(&input.breakdown), &stored).await {
            Ok(staff) => Some((id, staff)),
            Err(e) => {
                warn!(day_id = %id, error = %e, "Could not record staff for evaluation day");
                None
            }
        }
    }

    async fn verify_day(&self, examiner_id: ExaminerId, day_id: DayId) -> Option<DayId> {
        match self.store.get_day(day_id).await {
            Ok(Some(row)) if row.examiner_id == examiner_id => Some(row.id),
            Ok(Some(row)) => {
                warn!(
                    day_id = %day_id,
                    owner = %row.examiner_id,
                    examiner_id = %examiner_id,
                    "Evaluation day belongs to another examiner"
                );
                None
            }
            Ok(None) => {
                warn!(day_id = %day_id, "Evaluation day does not exist");
                None
            }
            Err(e) => {
                warn!(day_id = %day_id, error = %e, "Could not verify evaluation day");
                None
            }
        }
    }

    async fn create_day(
        &self,
        examiner_id: ExaminerId,
        input: &DayInput,
    ) -> Option<(DayId, Vec<StaffPapers>)> {
        let day = match self.days.create_day(examiner_id, input.date).await {
            Ok(day) => day,
            Err(e) => {
                warn!(
                    examiner_id = %examiner_id,
                    date = %input.date,
                    error = %e,
                    "Could not create evaluation day"
                );
                return None;
            }
        };

        match self.record_staff(day.id, &breakdown_staff(&input.breakdown), &[]).await {
            Ok(staff) => Some((day.id, staff)),
            Err(e) => {
                warn!(
                    day_id = %day.id,
                    error = %e,
                    "Could not record staff for new evaluation day"
                );
                if let Err(cleanup) = self.days.delete_day(day.id).await {
                    warn!(day_id = %day.id, error = %cleanup, "Could not remove incomplete evaluation day");
                }
                None
            }
        }
    }

    /// Reconciles `staff` onto the day and returns the rows as stored.
    ///
    /// Each submitted row takes over the identity of the first unclaimed
    /// stored row with the same name.
    async fn record_staff(
        &self,
        day_id: DayId,
        staff: &[StaffPapers],
        stored: &[StaffEvaluation],
    ) -> EngineResult<Vec<StaffPapers>> {
        let mut claimed = vec![false; stored.len()];
        let entries: Vec<StaffEntry> = staff
            .iter()
            .map(|s| {
                let id = stored
                    .iter()
                    .enumerate()
                    .find(|(i, row)| !claimed[*i] && row.staff_name == s.name)
                    .map(|(i, row)| {
                        claimed[i] = true;
                        row.id
                    });
                StaffEntry {
                    id,
                    staff_name: s.name.clone(),
                    papers_evaluated: s.papers,
                }
            })
            .collect();

        let outcome = self.reconciler.reconcile(day_id, &entries).await?;
        Ok(outcome.staff.iter().map(staff_papers).collect())
    }

    async fn call_remote(
        &self,
        remote: &dyn RemoteCalculator,
        examiner_id: ExaminerId,
        days: &[PreparedDay],
    ) -> Result<RemoteCalculation, RemoteError> {
        let request = RemoteRequest {
            examiner_id,
            evaluation_days: days
                .iter()
                .map(|d| RemoteDay {
                    day_id: d.id,
                    date: d.input.date,
                    staff: d
                        .staff
                        .iter()
                        .map(|s| RemoteStaff {
                            name: s.name.clone(),
                            papers: s.papers,
                        })
                        .collect(),
                })
                .collect(),
        };

        tokio::time::timeout(self.remote_timeout, remote.calculate(&request))
            .await
            .map_err(|_| RemoteError::Timeout(self.remote_timeout))?
    }

    fn remote_outcome(
        &self,
        examiner_id: ExaminerId,
        total_papers: u32,
        total_staff: u32,
        dropped_days: usize,
        result: RemoteCalculation,
    ) -> SalaryOutcome {
        let amounts = amounts_from_base(result.base_amount, self.rates.incentive_rate);
        if amounts.incentive_amount != result.incentive_amount
            || amounts.final_amount != result.final_amount
        {
            warn!(
                calculation_id = %result.calculation_id,
                reported_incentive = %result.incentive_amount,
                reported_final = %result.final_amount,
                incentive = %amounts.incentive_amount,
                final_amount = %amounts.final_amount,
                "Remote amounts are inconsistent; recomputed from base"
            );
        }
        if result.total_papers.is_some_and(|p| p != total_papers)
            || result.total_staff.is_some_and(|s| s != total_staff)
        {
            warn!(
                calculation_id = %result.calculation_id,
                reported_papers = ?result.total_papers,
                reported_staff = ?result.total_staff,
                total_papers,
                total_staff,
                "Remote totals disagree with submitted days"
            );
        }

        SalaryOutcome {
            calculation_id: result.calculation_id,
            examiner_id,
            total_papers,
            total_staff,
            amounts,
            calculated_locally: false,
            dropped_days,
        }
    }

    async fn compute_locally(
        &self,
        examiner_id: ExaminerId,
        total_papers: u32,
        total_staff: u32,
        dropped_days: usize,
        days: &[PreparedDay],
    ) -> EngineResult<SalaryOutcome> {
        let amounts = calculate_amounts(total_papers, &self.rates);
        let saved = self
            .repository
            .save(NewCalculation {
                examiner_id,
                total_papers,
                total_staff,
                amounts,
            })
            .await?;

        let day_ids: Vec<Option<DayId>> = days.iter().map(|d| Some(d.id)).collect();
        if let Err(e) = self.repository.link_days(saved.id, &day_ids).await {
            error!(
                calculation_id = %saved.id,
                error = %e,
                "Calculation saved but its days could not be linked"
            );
        }

        info!(
            examiner_id = %examiner_id,
            calculation_id = %saved.id,
            total_papers,
            final_amount = %amounts.final_amount,
            "Local salary calculation completed"
        );

        Ok(SalaryOutcome {
            calculation_id: saved.id,
            examiner_id,
            total_papers,
            total_staff,
            amounts,
            calculated_locally: true,
            dropped_days,
        })
    }
}
