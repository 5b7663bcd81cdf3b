use prometheus::{
    Encoder, HistogramOpts, HistogramTimer, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use service_core::error::AppError;
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static DB_QUERY_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

fn metric_error(name: &str, e: prometheus::Error) -> AppError {
    AppError::ConfigError(anyhow::anyhow!("Failed to initialize metric {}: {}", name, e))
}

/// Create and register the collectors. Calling it again is a no-op.
pub fn init_metrics() -> Result<(), AppError> {
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .map_err(|e| metric_error("http_requests_total", e))?;

    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ),
        &["method", "path", "status"],
    )
    .map_err(|e| metric_error("http_request_duration_seconds", e))?;

    let query_duration = HistogramVec::new(
        HistogramOpts::new("db_query_duration_seconds", "Database query latency in seconds"),
        &["operation"],
    )
    .map_err(|e| metric_error("db_query_duration_seconds", e))?;

    registry
        .register(Box::new(requests_total.clone()))
        .map_err(|e| metric_error("http_requests_total", e))?;
    registry
        .register(Box::new(request_duration.clone()))
        .map_err(|e| metric_error("http_request_duration_seconds", e))?;
    registry
        .register(Box::new(query_duration.clone()))
        .map_err(|e| metric_error("db_query_duration_seconds", e))?;

    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = DB_QUERY_DURATION_SECONDS.set(query_duration);
    Ok(())
}

/// Timer observing into `db_query_duration_seconds` when dropped; `None` before init.
pub fn db_timer(operation: &str) -> Option<HistogramTimer> {
    DB_QUERY_DURATION_SECONDS
        .get()
        .map(|histogram| histogram.with_label_values(&[operation]).start_timer())
}

pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return format!("# Failed to encode metrics: {}\n", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to UTF-8: {}", e);
        format!("# Failed to convert metrics to UTF-8: {}\n", e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposition_includes_registered_collectors() {
        init_metrics().unwrap();
        init_metrics().unwrap();

        if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
            counter.with_label_values(&["GET", "/kkdd", "200"]).inc();
        }
        drop(db_timer("list_checkpoints"));

        let text = get_metrics();
        assert!(text.contains("http_requests_total"));
        assert!(text.contains("db_query_duration_seconds"));
    }
}
