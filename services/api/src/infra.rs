use chrono::NaiveDate;
use houseswap::marketplace::domain::parse_date as parse_marketplace_date;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// clap value parser for `YYYY-MM-DD` arguments.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_marketplace_date(raw).map_err(|err| err.to_string())
}
