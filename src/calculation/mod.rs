//! Salary computation.
//!
//! This module contains the rate model, synthetic staff distribution, the
//! remote computation client, the per-session re-entrancy guard, the
//! calculation repository and the [`SalaryCalculator`] that ties them
//! together.

mod distribution;
mod rates;
mod remote;
mod repository;
mod salary;
mod session;

pub use distribution::{SYNTHETIC_STAFF_PREFIX, distribute_papers, synthesize_staff};
pub use rates::{MONEY_DECIMAL_PLACES, amounts_from_base, calculate_amounts};
pub use remote::{
    CALCULATE_SALARY_PATH, HttpRemoteCalculator, RemoteCalculation, RemoteCalculator, RemoteDay,
    RemoteError, RemoteRequest, RemoteResponse, RemoteStaff,
};
pub use repository::{CalculationRepository, to_record};
pub use salary::{SalaryCalculator, SalaryOutcome, SalaryRequest};
pub use session::{
    CalculationSession, ComputationGuard, SessionLease, SessionRegistry, SessionState,
};
