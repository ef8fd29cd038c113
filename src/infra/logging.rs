use tracing_subscriber::EnvFilter;

pub fn init() {
    // Honor RUST_LOG if set, default to info. Always write to stderr: in stdio
    // mode stdout carries MCP frames.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Record an upstream metric. Goes to the `metrics` recorder (a no-op until an
/// exporter is installed) and to the trace log.
pub fn record_metric(op: &'static str, metric: &'static str, value: f64) {
    metrics::histogram!(metric, "op" => op).record(value);
    tracing::debug!(op = op, metric = metric, value = value, "metric");
}

pub fn count(op: &'static str, metric: &'static str) {
    metrics::counter!(metric, "op" => op).increment(1);
    tracing::debug!(op = op, metric = metric, "counter");
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_is_idempotent() {
        super::init();
        super::init();
    }

    #[test]
    fn metrics_without_recorder_are_noops() {
        super::record_metric("search", "upstream_latency_ms", 12.0);
        super::count("search", "upstream_error_total");
    }
}
