use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use habita::workflows::reputation::{
    reputation_router, EventKind, EventTaxonomy, MetricsStore, ReputationLedger,
    ReputationService, TierAlertPublisher, TierSchedule,
};

pub(crate) fn with_reputation_routes<L, M, P>(
    service: Arc<ReputationService<L, M, P>>,
) -> axum::Router
where
    L: ReputationLedger + 'static,
    M: MetricsStore + 'static,
    P: TierAlertPublisher + 'static,
{
    let taxonomy = service.settings().taxonomy.clone();
    let tiers = service.settings().tiers.clone();

    reputation_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/reputation/taxonomy",
            axum::routing::get(move || taxonomy_endpoint(taxonomy, tiers)),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Thin admin read: the active point table and tier floors.
pub(crate) async fn taxonomy_endpoint(
    taxonomy: EventTaxonomy,
    tiers: TierSchedule,
) -> Json<serde_json::Value> {
    let weights: Vec<_> = EventKind::ALL
        .iter()
        .map(|kind| {
            json!({
                "event_kind": kind.label(),
                "points_delta": taxonomy.points_for(*kind),
            })
        })
        .collect();

    Json(json!({
        "weights": weights,
        "tiers": {
            "diamond_floor": tiers.diamond_floor,
            "gold_floor": tiers.gold_floor,
        },
    }))
}
