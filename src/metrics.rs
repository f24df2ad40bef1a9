//! Metrics for the index query codec and metadata result aggregation
//!
//! Prometheus counters registered in the default registry, exported in text
//! format through [`gather_metrics`].

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Total query encode operations
    pub static ref QUERY_ENCODE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "kuba_index_query_encode_total",
        "Total index query encode operations",
        &["status"]
    ).unwrap();

    /// Total query decode operations, by decode mode
    pub static ref QUERY_DECODE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "kuba_index_query_decode_total",
        "Total index query decode operations",
        &["mode", "status"]
    ).unwrap();

    /// Metadata tokens extracted by metadata-aware decodes
    pub static ref METADATA_TOKENS_TOTAL: IntCounter = register_int_counter!(
        "kuba_index_query_metadata_tokens_total",
        "Metadata tokens extracted from index queries"
    ).unwrap();

    /// Results contributed to metadata result accumulators
    pub static ref METADATA_RESULTS_ADDED_TOTAL: IntCounter = register_int_counter!(
        "kuba_index_metadata_results_added_total",
        "Per-block metadata results added to accumulators"
    ).unwrap();
}

/// Get metrics in Prometheus text format
pub fn gather_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {}", e))?;

    String::from_utf8(buffer).map_err(|e| format!("Metrics contain invalid UTF-8: {}", e))
}

/// Record an encode operation
#[inline]
pub fn record_encode(success: bool) {
    let status = if success { "success" } else { "error" };
    QUERY_ENCODE_TOTAL.with_label_values(&[status]).inc();
}

/// Record a decode operation
#[inline]
pub fn record_decode(mode: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    QUERY_DECODE_TOTAL.with_label_values(&[mode, status]).inc();
}

/// Record extracted metadata tokens
#[inline]
pub fn record_metadata_tokens(count: usize) {
    METADATA_TOKENS_TOTAL.inc_by(count as u64);
}

/// Record a result added to a metadata accumulator
#[inline]
pub fn record_metadata_result() {
    METADATA_RESULTS_ADDED_TOTAL.inc();
}
