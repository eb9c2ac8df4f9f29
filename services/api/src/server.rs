use crate::cli::ServeArgs;
use crate::infra::{
    default_settings, AppState, InMemoryMetricsStore, InMemoryReputationLedger,
    InMemoryTierAlertPublisher,
};
use crate::routes::with_reputation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use habita::config::AppConfig;
use habita::error::AppError;
use habita::telemetry;
use habita::workflows::reputation::ReputationService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let ledger = Arc::new(InMemoryReputationLedger::default());
    let metrics_store = Arc::new(InMemoryMetricsStore::default());
    let alerts = Arc::new(InMemoryTierAlertPublisher::default());
    let reputation_service = Arc::new(ReputationService::new(
        ledger,
        metrics_store,
        alerts,
        default_settings(),
    ));

    let app = with_reputation_routes(reputation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "advisor reputation ledger ready");

    axum::serve(listener, app).await?;
    Ok(())
}
