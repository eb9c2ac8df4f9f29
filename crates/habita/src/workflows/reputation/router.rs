use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::aggregate::MetricsStore;
use super::domain::{AdvisorId, EventSubmission};
use super::ledger::ReputationLedger;
use super::publisher::TierAlertPublisher;
use super::service::{ReputationError, ReputationService};

const DEFAULT_ACTIVITY_LIMIT: usize = 20;
const MAX_ACTIVITY_LIMIT: usize = 100;

/// Router builder exposing HTTP endpoints for event submission and the
/// advisor standing/activity reads.
pub fn reputation_router<L, M, P>(service: Arc<ReputationService<L, M, P>>) -> Router
where
    L: ReputationLedger + 'static,
    M: MetricsStore + 'static,
    P: TierAlertPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/advisors/:advisor_id/reputation/events",
            post(record_event_handler::<L, M, P>).get(activity_handler::<L, M, P>),
        )
        .route(
            "/api/v1/advisors/:advisor_id/reputation",
            get(standing_handler::<L, M, P>),
        )
        .with_state(service)
}

/// Request body for event submission. The idempotency key is required so the
/// upstream workflow can retry safely; an optional deadline bounds the
/// aggregate settle loop.
#[derive(Debug, Deserialize)]
pub(crate) struct EventPayload {
    pub(crate) event_kind: String,
    pub(crate) reason: String,
    pub(crate) idempotency_key: String,
    #[serde(default)]
    pub(crate) deadline_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivityParams {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

pub(crate) async fn record_event_handler<L, M, P>(
    State(service): State<Arc<ReputationService<L, M, P>>>,
    Path(advisor_id): Path<String>,
    axum::Json(payload): axum::Json<EventPayload>,
) -> Response
where
    L: ReputationLedger + 'static,
    M: MetricsStore + 'static,
    P: TierAlertPublisher + 'static,
{
    let submission = EventSubmission {
        advisor_id: AdvisorId(advisor_id),
        event_kind: payload.event_kind,
        reason: payload.reason,
        idempotency_key: payload.idempotency_key,
    };
    let deadline = payload
        .deadline_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));

    match service.apply(submission, deadline) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(
            error @ (ReputationError::InvalidEventKind(_) | ReputationError::InvalidReason),
        ) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(
            error @ (ReputationError::ConcurrencyExhausted { .. } | ReputationError::Timeout),
        ) => {
            let payload = json!({
                "error": error.to_string(),
                "retriable": true,
                "hint": "retry with the same idempotency key",
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn standing_handler<L, M, P>(
    State(service): State<Arc<ReputationService<L, M, P>>>,
    Path(advisor_id): Path<String>,
) -> Response
where
    L: ReputationLedger + 'static,
    M: MetricsStore + 'static,
    P: TierAlertPublisher + 'static,
{
    let id = AdvisorId(advisor_id);
    match service.metrics(&id) {
        Ok(metrics) => (StatusCode::OK, axum::Json(metrics.status_view())).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn activity_handler<L, M, P>(
    State(service): State<Arc<ReputationService<L, M, P>>>,
    Path(advisor_id): Path<String>,
    Query(params): Query<ActivityParams>,
) -> Response
where
    L: ReputationLedger + 'static,
    M: MetricsStore + 'static,
    P: TierAlertPublisher + 'static,
{
    let id = AdvisorId(advisor_id);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .min(MAX_ACTIVITY_LIMIT);

    match service.activity(&id, limit) {
        Ok(events) => {
            let entries: Vec<_> = events.iter().map(|event| event.audit_view()).collect();
            (StatusCode::OK, axum::Json(entries)).into_response()
        }
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
