use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("scan_cycles_total").absolute(0);
    counter!("scan_failures_total").absolute(0);
    counter!("circuit_breaker_trips_total").absolute(0);
    counter!("alerts_sent_total").absolute(0);
    counter!("alerts_failed_total").absolute(0);
    counter!("alerts_dropped_total").absolute(0);

    // Pre-register gauges at zero.
    gauge!("bot_running").set(0.0);
    gauge!("daily_losses").set(0.0);
    gauge!("active_trades").set(0.0);

    Ok(handle)
}

/// Handle backed by a recorder that is never installed globally. Metric
/// macros become no-ops; used by tests that build an `AppState`.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}
