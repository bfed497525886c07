use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Calling it again is a no-op.
pub fn init_metrics() -> anyhow::Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Count a payment lifecycle event (`created`, `confirmed`, `refunded`).
pub fn record_payment_event(event: &'static str) {
    counter!("payment_events_total", "event" => event).increment(1);
}

/// Count a failed gateway call by operation.
pub fn record_gateway_error(operation: &'static str) {
    counter!("payment_gateway_errors_total", "operation" => operation).increment(1);
}
