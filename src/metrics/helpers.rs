//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    DISPATCH_LATENCY, EVENTS_RECEIVED_TOTAL, EVENTS_SKIPPED_TOTAL, NOTIFICATIONS_FAILED_TOTAL,
    NOTIFICATIONS_SENT_TOTAL, REDIS_CONNECTION_STATUS, REDIS_MESSAGES_RECEIVED,
    REDIS_RECONNECTIONS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording inbound event metrics
pub struct EventMetrics;

impl EventMetrics {
    pub fn record_received(kind: &str) {
        EVENTS_RECEIVED_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn record_skipped(reason: &str) {
        EVENTS_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
    }
}

/// Helper struct for recording delivery metrics
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    pub fn record_sent(kind: &str) {
        NOTIFICATIONS_SENT_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn record_failed(kind: &str) {
        NOTIFICATIONS_FAILED_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record dispatch latency in seconds
    pub fn observe_latency(seconds: f64) {
        DISPATCH_LATENCY.observe(seconds);
    }
}

/// Helper struct for Redis trigger metrics
pub struct RedisMetrics;

impl RedisMetrics {
    pub fn set_connected(connected: bool) {
        REDIS_CONNECTION_STATUS.set(if connected { 1 } else { 0 });
    }

    pub fn record_reconnection() {
        REDIS_RECONNECTIONS_TOTAL.inc();
    }

    pub fn record_message() {
        REDIS_MESSAGES_RECEIVED.inc();
    }
}
