//! HTTP API module for the examiner payroll engine.
//!
//! This module exposes evaluation day entry, staff reconciliation, salary
//! calculation and report aggregation as REST endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::{SESSION_HEADER, create_router};
pub use request::{
    CalculateRequest, CreateDayRequest, DayInputRequest, ReportRequest, StaffEntryRequest,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
