//! Prometheus metrics for skillbridge-service.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Once, OnceLock};

static INIT: Once = Once::new();

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// API metrics
pub static REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Model metrics
pub static GENAI_PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static GENAI_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Store metrics
pub static HISTORY_STORE_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Export metrics
pub static PDF_EXPORTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once; only the first call
/// registers anything.
pub fn init_metrics() {
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new(
            "skillbridge_requests_total",
            "Total API operations by outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create skillbridge_requests_total metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "genai_provider_latency_seconds",
            "Generative model API latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["model"],
    )
    .expect("Failed to create genai_provider_latency_seconds metric");

    let tokens_total = IntCounterVec::new(
        Opts::new("genai_tokens_total", "Total tokens processed"),
        &["model", "type"], // type: input, output
    )
    .expect("Failed to create genai_tokens_total metric");

    let store_operations = IntCounterVec::new(
        Opts::new(
            "history_store_operations_total",
            "History store operations by outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create history_store_operations_total metric");

    let pdf_exports = IntCounterVec::new(
        Opts::new("pdf_exports_total", "PDF exports by outcome"),
        &["outcome"],
    )
    .expect("Failed to create pdf_exports_total metric");

    registry
        .register(Box::new(requests_total.clone()))
        .expect("Failed to register skillbridge_requests_total");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register genai_provider_latency_seconds");
    registry
        .register(Box::new(tokens_total.clone()))
        .expect("Failed to register genai_tokens_total");
    registry
        .register(Box::new(store_operations.clone()))
        .expect("Failed to register history_store_operations_total");
    registry
        .register(Box::new(pdf_exports.clone()))
        .expect("Failed to register pdf_exports_total");

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = REQUESTS_TOTAL.set(requests_total);
    let _ = GENAI_PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = GENAI_TOKENS_TOTAL.set(tokens_total);
    let _ = HISTORY_STORE_OPERATIONS_TOTAL.set(store_operations);
    let _ = PDF_EXPORTS_TOTAL.set(pdf_exports);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
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

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record the outcome of an API operation.
pub fn record_request(operation: &str, outcome: &str) {
    if let Some(counter) = REQUESTS_TOTAL.get() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
}

/// Record provider latency.
pub fn record_provider_latency(model: &str, duration_secs: f64) {
    if let Some(histogram) = GENAI_PROVIDER_LATENCY_SECONDS.get() {
        histogram.with_label_values(&[model]).observe(duration_secs);
    }
}

/// Record token usage.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(counter) = GENAI_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input_tokens.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output_tokens.max(0) as u64);
    }
}

/// Record a history store operation.
pub fn record_store_operation(operation: &str, outcome: &str) {
    if let Some(counter) = HISTORY_STORE_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
}

/// Record a PDF export.
pub fn record_pdf_export(outcome: &str) {
    if let Some(counter) = PDF_EXPORTS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_metrics_are_exported() {
        init_metrics();
        init_metrics();
        record_request("recommend", "ok");
        record_pdf_export("ok");

        let text = get_metrics();
        assert!(text.contains("skillbridge_requests_total"));
        assert!(text.contains("pdf_exports_total"));
    }
}
