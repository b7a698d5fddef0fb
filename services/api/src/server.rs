use crate::cli::ServeArgs;
use crate::infra::{portal_state, spawn_sweeper, AppState, MemoryBackends};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use nomination_portal::config::AppConfig;
use nomination_portal::error::AppError;
use nomination_portal::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const SWEEP_PERIOD: Duration = Duration::from_secs(60);

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

    let backends = MemoryBackends::new(&config.portal.storage_base_url);
    let state = portal_state(&config.portal, &backends);
    let sweeper = spawn_sweeper(state.clone(), SWEEP_PERIOD);

    let app = with_portal_routes(state)
        .layer(Extension(app_state))
        .layer(Extension(backends.blobs.clone()))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        access_code = config.portal.form_access_code.is_some(),
        "nomination portal ready"
    );

    let served = axum::serve(listener, app).await;
    sweeper.abort();
    served?;
    Ok(())
}
