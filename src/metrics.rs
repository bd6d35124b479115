/// Metrics and telemetry for the geopost service
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Post ingestion outcomes per pipeline stage
/// - Face annotation outcomes
/// - Search requests and hit counts

use lazy_static::lazy_static;
use prometheus::{
    register_gauge, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Encoder, Gauge, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========== Ingestion Metrics ==========

    /// Posts successfully indexed
    pub static ref POSTS_INGESTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "posts_ingested_total",
        "Total number of posts indexed",
        &["media_type"]
    )
    .unwrap();

    /// Pipeline failures by stage
    pub static ref INGEST_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ingest_failures_total",
        "Total number of failed submissions by pipeline stage",
        &["stage"]
    )
    .unwrap();

    /// Face annotation outcomes
    pub static ref ANNOTATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "annotations_total",
        "Total number of face annotations",
        &["outcome"]
    )
    .unwrap();

    // ========== Search Metrics ==========

    /// Searches by kind
    pub static ref SEARCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "searches_total",
        "Total number of searches",
        &["kind"]
    )
    .unwrap();

    /// Posts returned per search
    pub static ref SEARCH_HITS: HistogramVec = register_histogram_vec!(
        "search_hits",
        "Number of posts returned per search",
        &["kind"],
        vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0]
    )
    .unwrap();

    /// Documents skipped during decode
    pub static ref NONCONFORMING_DOCUMENTS_TOTAL: IntCounter = register_int_counter!(
        "nonconforming_documents_total",
        "Total number of search hits that did not decode as posts"
    )
    .unwrap();

    // ========== System Metrics ==========

    /// Application uptime in seconds
    pub static ref UPTIME_SECONDS: Gauge = register_gauge!(
        "uptime_seconds",
        "Application uptime in seconds"
    )
    .unwrap();

    static ref STARTED_AT: Instant = Instant::now();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    UPTIME_SECONDS.set(STARTED_AT.elapsed().as_secs_f64());

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Mark process start for the uptime gauge
pub fn init() {
    lazy_static::initialize(&STARTED_AT);
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record an indexed post
pub fn record_post_ingested(media_type: &str) {
    POSTS_INGESTED_TOTAL.with_label_values(&[media_type]).inc();
}

/// Record a pipeline failure
pub fn record_ingest_failure(stage: &str) {
    INGEST_FAILURES_TOTAL.with_label_values(&[stage]).inc();
}

/// Record an annotation outcome: "face", "no_face" or "error"
pub fn record_annotation(outcome: &str) {
    ANNOTATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record a search
pub fn record_search(kind: &str) {
    SEARCHES_TOTAL.with_label_values(&[kind]).inc();
}

/// Record how many posts a search returned
pub fn record_search_hits(kind: &str, hits: usize) {
    SEARCH_HITS.with_label_values(&[kind]).observe(hits as f64);
}

/// Record a search hit that failed to decode
pub fn record_nonconforming_document() {
    NONCONFORMING_DOCUMENTS_TOTAL.inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_recorded_metrics() {
        record_search("radius");
        record_ingest_failure("upload");

        let output = render_metrics();
        assert!(output.contains("searches_total"));
        assert!(output.contains("ingest_failures_total"));
        assert!(output.contains("uptime_seconds"));
    }

    #[test]
    fn test_search_hits_observed_per_kind() {
        let before = SEARCH_HITS.with_label_values(&["test_kind"]).get_sample_count();
        record_search_hits("test_kind", 3);

        let histogram = SEARCH_HITS.with_label_values(&["test_kind"]);
        assert_eq!(histogram.get_sample_count(), before + 1);
        assert!(histogram.get_sample_sum() >= 3.0);
        assert!(render_metrics().contains("search_hits_bucket"));
    }
}
