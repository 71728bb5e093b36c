//! Remote computation service client.
//!
//! The remote service computes the salary for a set of evaluation days and
//! persists the calculation row itself. Its response is untrusted: every
//! numeric field is coerced through [`crate::models::coerce`], and a missing
//! or unusable `calculationId` makes the whole response malformed.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{CalculationId, DayId, ExaminerId, coerce};

/// Path of the salary endpoint below the service base URL.
pub const CALCULATE_SALARY_PATH: &str = "/calculate-salary";

/// Errors from the remote computation service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The HTTP exchange failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response could not be used.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The service did not answer in time.
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// One staff line in a remote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteStaff {
    /// Staff display name.
    pub name: String,
    /// Papers evaluated.
    pub papers: u32,
}

/// One evaluation day in a remote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDay {
    /// Persisted day identity.
    pub day_id: DayId,
    /// Evaluation date.
    pub date: NaiveDate,
    /// Staff lines, synthesized when only aggregates are known.
    pub staff: Vec<RemoteStaff>,
}

/// Request body sent to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRequest {
    /// The examiner being paid.
    pub examiner_id: ExaminerId,
    /// The contributing days.
    pub evaluation_days: Vec<RemoteDay>,
}

/// Response body as received, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteResponse {
    /// Base amount.
    #[serde(default, deserialize_with = "coerce::lenient_decimal")]
    pub base_amount: Decimal,
    /// Incentive amount.
    #[serde(default, deserialize_with = "coerce::lenient_decimal")]
    pub incentive_amount: Decimal,
    /// Final amount.
    #[serde(default, deserialize_with = "coerce::lenient_decimal")]
    pub final_amount: Decimal,
    /// Papers counted by the service.
    #[serde(default, deserialize_with = "coerce::lenient_opt_count")]
    pub total_papers: Option<u32>,
    /// Staff counted by the service.
    #[serde(default, deserialize_with = "coerce::lenient_opt_count")]
    pub total_staff: Option<u32>,
    /// Identity of the calculation row the service persisted.
    #[serde(default, deserialize_with = "coerce::lenient_id")]
    pub calculation_id: Option<CalculationId>,
}

/// A validated remote result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCalculation {
    /// Identity of the persisted calculation.
    pub calculation_id: CalculationId,
    /// Base amount.
    pub base_amount: Decimal,
    /// Incentive amount as reported.
    pub incentive_amount: Decimal,
    /// Final amount as reported.
    pub final_amount: Decimal,
    /// Papers, if the service reported them.
    pub total_papers: Option<u32>,
    /// Staff, if the service reported them.
    pub total_staff: Option<u32>,
}

impl TryFrom<RemoteResponse> for RemoteCalculation {
    type Error = RemoteError;

    fn try_from(response: RemoteResponse) -> Result<Self, Self::Error> {
        let calculation_id = response
            .calculation_id
            .ok_or_else(|| RemoteError::Malformed("missing calculationId".to_string()))?;
        if response.base_amount.is_sign_negative() {
            return Err(RemoteError::Malformed(format!(
                "negative baseAmount {}",
                response.base_amount
            )));
        }
        Ok(RemoteCalculation {
            calculation_id,
            base_amount: response.base_amount,
            incentive_amount: response.incentive_amount,
            final_amount: response.final_amount,
            total_papers: response.total_papers,
            total_staff: response.total_staff,
        })
    }
}

/// A service that computes (and persists) salary calculations.
#[async_trait]
pub trait RemoteCalculator: Send + Sync {
    /// Computes the salary for `request`.
    async fn calculate(&self, request: &RemoteRequest) -> Result<RemoteCalculation, RemoteError>;
}

/// [`RemoteCalculator`] over HTTP.
pub struct HttpRemoteCalculator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteCalculator {
    /// Creates a client for the service at `base_url`.
    ///
    /// `timeout` bounds each request at the transport level.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RemoteCalculator for HttpRemoteCalculator {
    async fn calculate(&self, request: &RemoteRequest) -> Result<RemoteCalculation, RemoteError> {
        let url = format!("{}{}", self.base_url, CALCULATE_SALARY_PATH);
        info!(
            url = %url,
            examiner_id = %request.examiner_id,
            days = request.evaluation_days.len(),
            "Requesting remote salary calculation"
        );

        let resp = self.client.post(&url).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let response: RemoteResponse = serde_json::from_str(&body)
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;
        debug!(?response, "Remote salary response");
        RemoteCalculation::try_from(response)
    }
}
