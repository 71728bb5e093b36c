//! HTTP request handlers for the payroll engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::str::FromStr;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::SalaryOutcome;
use crate::error::EngineError;
use crate::evaluation::ReconcileOutcome;
use crate::models::{
    Calculation, CalculationDetail, CalculationId, DayId, EvaluationDay, ExaminerId, Report,
};

use super::request::{
    CalculateRequest, CreateDayRequest, ReportRequest, StaffEntryRequest, staff_entries,
};
use super::response::ApiErrorResponse;
use super::state::AppState;

/// Header carrying the caller's session id for calculation re-entrancy.
pub const SESSION_HEADER: &str = "x-session-id";

type ApiResult<T> = Result<T, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/examiners/:examiner_id/days",
            post(create_day_handler).get(list_days_handler),
        )
        .route(
            "/examiners/:examiner_id/calculations",
            get(list_calculations_handler),
        )
        .route("/days/:day_id", get(get_day_handler).delete(delete_day_handler))
        .route("/days/:day_id/staff", put(reconcile_staff_handler))
        .route("/calculations", post(calculate_handler))
        .route("/calculations/:calculation_id", get(get_calculation_handler))
        .route("/reports", post(report_handler))
        .with_state(state)
}

fn parse_id<T: FromStr>(name: &str, raw: &str) -> ApiResult<T> {
    raw.parse()
        .map_err(|_| ApiErrorResponse::bad_parameter(name, raw))
}

fn body<T>(correlation_id: Uuid, payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!(
            correlation_id = %correlation_id,
            error = %rejection.body_text(),
            "Rejected request body"
        );
        ApiErrorResponse::from(rejection)
    })
}

fn failed(correlation_id: Uuid, error: EngineError) -> ApiErrorResponse {
    warn!(correlation_id = %correlation_id, error = %error, "Request failed");
    error.into()
}

/// Handler for `POST /examiners/:examiner_id/days`.
async fn create_day_handler(
    State(state): State<AppState>,
    Path(examiner_id): Path<String>,
    payload: Result<Json<CreateDayRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EvaluationDay>)> {
    let correlation_id = Uuid::new_v4();
    let examiner_id: ExaminerId = parse_id("examiner_id", &examiner_id)?;
    let request = body(correlation_id, payload)?;
    info!(
        correlation_id = %correlation_id,
        examiner_id = %examiner_id,
        date = %request.date,
        "Creating evaluation day"
    );

    let day = state
        .days()
        .create_day(examiner_id, request.date)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok((StatusCode::CREATED, Json(day)))
}

/// Handler for `GET /examiners/:examiner_id/days`.
async fn list_days_handler(
    State(state): State<AppState>,
    Path(examiner_id): Path<String>,
) -> ApiResult<Json<Vec<EvaluationDay>>> {
    let correlation_id = Uuid::new_v4();
    let examiner_id: ExaminerId = parse_id("examiner_id", &examiner_id)?;
    let days = state
        .days()
        .list_days(examiner_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(days))
}

/// Handler for `GET /days/:day_id`.
async fn get_day_handler(
    State(state): State<AppState>,
    Path(day_id): Path<String>,
) -> ApiResult<Json<EvaluationDay>> {
    let correlation_id = Uuid::new_v4();
    let day_id: DayId = parse_id("day_id", &day_id)?;
    let day = state
        .days()
        .get_day_with_staff(day_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(day))
}

/// Handler for `DELETE /days/:day_id`.
async fn delete_day_handler(
    State(state): State<AppState>,
    Path(day_id): Path<String>,
) -> ApiResult<StatusCode> {
    let correlation_id = Uuid::new_v4();
    let day_id: DayId = parse_id("day_id", &day_id)?;
    state
        .days()
        .delete_day(day_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `PUT /days/:day_id/staff`.
///
/// Replaces the day's staff rows with the submitted list.
async fn reconcile_staff_handler(
    State(state): State<AppState>,
    Path(day_id): Path<String>,
    payload: Result<Json<Vec<StaffEntryRequest>>, JsonRejection>,
) -> ApiResult<Json<ReconcileOutcome>> {
    let correlation_id = Uuid::new_v4();
    let day_id: DayId = parse_id("day_id", &day_id)?;
    let rows = body(correlation_id, payload)?;
    let entries = staff_entries(rows).map_err(|e| failed(correlation_id, e))?;

    let start_time = Instant::now();
    let outcome = state
        .reconciler()
        .reconcile(day_id, &entries)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    info!(
        correlation_id = %correlation_id,
        day_id = %day_id,
        deleted = outcome.deleted.len(),
        inserted = outcome.inserted,
        updated = outcome.updated,
        duration_us = start_time.elapsed().as_micros(),
        "Staff reconciled"
    );
    Ok(Json(outcome))
}

/// Handler for `POST /calculations`.
///
/// Calls sharing an `x-session-id` header are serialized: a second call
/// while one is in flight gets 409. Without the header, the examiner id
/// keys the session.
async fn calculate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> ApiResult<Json<SalaryOutcome>> {
    let correlation_id = Uuid::new_v4();
    let request = body(correlation_id, payload)?
        .into_salary_request()
        .map_err(|e| failed(correlation_id, e))?;

    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| request.examiner_id.to_string());
    info!(
        correlation_id = %correlation_id,
        session_id = %session_id,
        examiner_id = %request.examiner_id,
        days = request.days.len(),
        "Processing calculation request"
    );

    let session = state.sessions().lease(&session_id);
    let start_time = Instant::now();
    let outcome = state
        .calculator()
        .calculate(&session, request)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    info!(
        correlation_id = %correlation_id,
        calculation_id = %outcome.calculation_id,
        calculated_locally = outcome.calculated_locally,
        final_amount = %outcome.amounts.final_amount,
        duration_us = start_time.elapsed().as_micros(),
        "Calculation completed successfully"
    );
    Ok(Json(outcome))
}

/// Handler for `GET /calculations/:calculation_id`.
async fn get_calculation_handler(
    State(state): State<AppState>,
    Path(calculation_id): Path<String>,
) -> ApiResult<Json<CalculationDetail>> {
    let correlation_id = Uuid::new_v4();
    let calculation_id: CalculationId = parse_id("calculation_id", &calculation_id)?;
    let detail = state
        .repository()
        .get_by_id(calculation_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(detail))
}

/// Handler for `GET /examiners/:examiner_id/calculations`.
async fn list_calculations_handler(
    State(state): State<AppState>,
    Path(examiner_id): Path<String>,
) -> ApiResult<Json<Vec<Calculation>>> {
    let correlation_id = Uuid::new_v4();
    let examiner_id: ExaminerId = parse_id("examiner_id", &examiner_id)?;
    let calculations = state
        .repository()
        .list_for_examiner(examiner_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(calculations))
}

/// Handler for `POST /reports`.
///
/// Loads the named calculations, appends any inline records and returns
/// the aggregated report tree.
async fn report_handler(
    State(state): State<AppState>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> ApiResult<Json<Report>> {
    let correlation_id = Uuid::new_v4();
    let request = body(correlation_id, payload)?;

    let mut records = Vec::with_capacity(request.calculation_ids.len() + request.records.len());
    for raw in &request.calculation_ids {
        let id: CalculationId = parse_id("calculation_id", raw)?;
        let record = state
            .repository()
            .load_record(id)
            .await
            .map_err(|e| failed(correlation_id, e))?;
        records.push(record);
    }
    records.extend(request.records);

    let report = state.aggregator().aggregate(&records);
    info!(
        correlation_id = %correlation_id,
        records = records.len(),
        departments = report.departments.len(),
        total_amount = %report.totals.total_amount,
        "Report aggregated"
    );
    Ok(Json(report))
}
