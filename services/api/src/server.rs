use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use houseswap::config::AppConfig;
use houseswap::error::AppError;
use houseswap::marketplace::{InMemoryMarketplace, NavigationHistory, SwapService};
use houseswap::telemetry;
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

    telemetry::init(config.environment, &config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryMarketplace::default());
    let service = Arc::new(SwapService::new(repository, config.marketplace));
    let navigation = Arc::new(NavigationHistory::new(config.marketplace.history_capacity));

    let app = with_marketplace_routes(service, navigation)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        expiry_days = config.marketplace.expiry_days,
        "houseswap marketplace ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
