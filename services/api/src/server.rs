use crate::cli::ServeArgs;
use crate::infra::{load_inventory, valuation_engine, AppState};
use crate::routes::app_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rema::config::AppConfig;
use rema::error::AppError;
use rema::telemetry;
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
    if let Some(inventory) = args.inventory.take() {
        config.inventory.data_path = inventory;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let engine = valuation_engine(&config.valuation)?;
    let (inventory, summary) =
        load_inventory(&config.inventory.data_path, engine.clone(), &config.inventory)?;
    info!(
        path = %config.inventory.data_path.display(),
        imported = summary.imported,
        skipped = summary.skipped,
        unvalued = summary.unvalued,
        "inventory loaded"
    );

    let app = app_router(engine, inventory)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "valuation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
