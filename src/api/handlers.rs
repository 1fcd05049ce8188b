use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::catalog::{LoadFilter, LoadRecord};
use crate::cli::app::{Authentication, CallReport};
use crate::cli::RateDeskApp;
use crate::error::RateDeskError;
use crate::ledger::{CallOutcome, ChainVerification};
use crate::metrics::{MetricsQuery, MetricsSnapshot};
use crate::negotiation::{OfferInput, OfferOutcome, Verdict};
use crate::types::{CarrierId, LoadId};

/// Error body returned by every route: `{"detail": "..."}`
#[derive(Debug)]
pub struct ApiError(pub RateDeskError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RateDeskError::InvalidOffer(_)
            | RateDeskError::InvalidOutcome(_)
            | RateDeskError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RateDeskError::LoadNotFound(_) => StatusCode::NOT_FOUND,
            RateDeskError::Unauthorized => StatusCode::UNAUTHORIZED,
            RateDeskError::DashboardDisabled => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RateDeskError> for ApiError {
    fn from(err: RateDeskError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_client_error() {
            tracing::debug!("Request rejected ({}): {}", status, self.0);
        } else {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub mc_number: CarrierId,
}

#[derive(Debug, Deserialize)]
pub struct NegotiateRequest {
    pub mc_number: CarrierId,
    pub load_id: LoadId,
    pub offer: OfferInput,
}

/// Negotiation reply as the voice agent reads it
#[derive(Debug, Serialize)]
pub struct NegotiateResponse {
    pub accepted: bool,
    pub verdict: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_offer: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
    pub round: u32,
    pub listed: Decimal,
    pub ceiling: Decimal,
}

impl From<OfferOutcome> for NegotiateResponse {
    fn from(outcome: OfferOutcome) -> Self {
        let (verdict, price, counter_offer, reason) = match outcome.verdict {
            Verdict::Accept { price } => ("ACCEPT", Some(price), None, None),
            Verdict::Counter { price } => ("COUNTER", None, Some(price), None),
            Verdict::Reject { .. } => ("REJECT", None, None, Some("max rounds reached")),
        };

        Self {
            accepted: outcome.verdict.is_accept(),
            verdict,
            price,
            counter_offer,
            reason,
            note: outcome.replayed.then_some("already settled"),
            round: outcome.round,
            listed: outcome.board_rate,
            ceiling: outcome.ceiling,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CallResultResponse {
    pub ok: bool,
    pub summary: CallOutcome,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetricsParams {
    pub recent: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// GET /
pub async fn health(State(app): State<RateDeskApp>) -> Json<Value> {
    Json(json!({
        "message": "ratedesk is running",
        "open_negotiations": app.open_negotiations(),
    }))
}

/// POST /api/authenticate
pub async fn authenticate(
    State(app): State<RateDeskApp>,
    Json(body): Json<AuthenticateRequest>,
) -> ApiResult<Authentication> {
    Ok(Json(app.authenticate(&body.mc_number).await?))
}

/// GET /api/loads
pub async fn get_loads(
    State(app): State<RateDeskApp>,
    Query(filter): Query<LoadFilter>,
) -> Json<Vec<LoadRecord>> {
    Json(app.search_loads(&filter))
}

/// POST /api/negotiate
pub async fn negotiate(
    State(app): State<RateDeskApp>,
    Json(body): Json<NegotiateRequest>,
) -> ApiResult<NegotiateResponse> {
    let outcome = app.negotiate(&body.mc_number, &body.load_id, &body.offer)?;
    Ok(Json(outcome.into()))
}

/// POST /api/call/result
pub async fn call_result(
    State(app): State<RateDeskApp>,
    Json(report): Json<CallReport>,
) -> ApiResult<CallResultResponse> {
    let summary = app.record_call(report)?;
    Ok(Json(CallResultResponse { ok: true, summary }))
}

/// GET /api/metrics
pub async fn get_metrics(
    State(app): State<RateDeskApp>,
    Query(params): Query<MetricsParams>,
) -> Json<MetricsSnapshot> {
    let recent = params.recent.unwrap_or(app.config().recent_window);
    Json(app.metrics(&MetricsQuery::recent(recent)))
}

/// GET /dashboard/data
pub async fn dashboard_data(
    State(app): State<RateDeskApp>,
    Query(params): Query<DashboardParams>,
) -> ApiResult<MetricsSnapshot> {
    let query = MetricsQuery::recent(app.config().recent_window)
        .with_range(params.from.as_deref(), params.to.as_deref());
    Ok(Json(app.dashboard(&query)?))
}

/// GET /api/ledger/verify
pub async fn verify_ledger(State(app): State<RateDeskApp>) -> ApiResult<ChainVerification> {
    Ok(Json(app.verify_ledger()?))
}
