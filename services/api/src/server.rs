use crate::cli::ServeArgs;
use crate::infra::{seed_catalog, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use placement_portal::config::AppConfig;
use placement_portal::error::AppError;
use placement_portal::portal::{MemoryIdentityProvider, MemoryStore, PlacementPortal};
use placement_portal::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(MemoryStore::new());
    let identity = Arc::new(MemoryIdentityProvider::new(
        config.portal.require_email_verification,
    ));
    let portal = Arc::new(PlacementPortal::new(store, identity, &config.portal));

    if args.seed {
        seed_catalog(portal.as_ref(), Local::now().date_naive())?;
    }

    let app = with_operational_routes(portal)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        jobs_per_page = config.portal.jobs_per_page,
        "placement portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
