//! Prometheus metrics for showreel-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

const WS_CONNECTIONS_ACTIVE: &str = "showreel_ws_connections_active";
const WS_MESSAGES_TOTAL: &str = "showreel_ws_messages_total";
const SNAPSHOTS_PUSHED_TOTAL: &str = "showreel_snapshots_pushed_total";
const DOCUMENT_WRITES_TOTAL: &str = "showreel_document_writes_total";
const VALIDATION_FAILURES_TOTAL: &str = "showreel_validation_failures_total";
const RATE_LIMITED_TOTAL: &str = "showreel_rate_limited_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Increment active WebSocket connections.
pub fn inc_ws_connections() {
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
}

/// Decrement active WebSocket connections.
pub fn dec_ws_connections() {
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record a WebSocket message.
///
/// # Arguments
///
/// * `direction` - "inbound" or "outbound"
/// * `msg_type` - Message type (e.g., "subscribe", "ping")
pub fn record_ws_message(direction: &str, msg_type: &str) {
    counter!(
        WS_MESSAGES_TOTAL,
        "direction" => direction.to_string(),
        "type" => msg_type.to_string()
    )
    .increment(1);
}

/// Record a snapshot sent to a subscriber.
pub fn record_snapshot_pushed() {
    counter!(SNAPSHOTS_PUSHED_TOTAL).increment(1);
}

/// Record a document mutation.
///
/// # Arguments
///
/// * `operation` - "set", "merge" or "delete"
pub fn record_document_write(operation: &str) {
    counter!(
        DOCUMENT_WRITES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `validation_type` - Type of validation that failed (path, document_size, message_size)
pub fn record_validation_failure(validation_type: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "type" => validation_type.to_string()
    )
    .increment(1);
}

/// Record a rate-limited request.
pub fn record_rate_limited(source: &str) {
    counter!(
        RATE_LIMITED_TOTAL,
        "source" => source.to_string()
    )
    .increment(1);
}
