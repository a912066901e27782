use crate::cli::ServeArgs;
use crate::infra::{build_services, AppState, InMemoryStore};
use crate::routes::with_reliablenet_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use reliablenet::auth::ApiAuth;
use reliablenet::config::AppConfig;
use reliablenet::error::AppError;
use reliablenet::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if config.auth.api_tokens.is_empty() {
        warn!("RELIABLENET_API_TOKENS is empty; every mutating route will answer 401");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryStore::default());
    let (services, worker) = build_services(store, &config.badges);

    let app = with_reliablenet_routes(&services)
        .layer(Extension(ApiAuth::new(config.auth.clone())))
        .layer(Extension(app_state))
        .layer(prometheus_layer);
    drop(services);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        recompute_mode = ?config.badges.recompute_mode,
        "reliablenet api ready"
    );

    axum::serve(listener, app).await?;

    // The router owned the last scheduler handles; the worker drains what is left.
    if let Some(worker) = worker {
        if let Err(err) = worker.await {
            error!(error = %err, "badge recompute worker failed");
        }
    }
    Ok(())
}
