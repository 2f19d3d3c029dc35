//! Prometheus metrics for the enrolment notification service.
//!
//! - Event metrics (received by kind, skipped by reason)
//! - Delivery metrics (sent and failed by kind, dispatch latency)
//! - Redis trigger health

mod helpers;

pub use helpers::{encode_metrics, EventMetrics, DeliveryMetrics, RedisMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "enrol";

lazy_static! {
    // ============================================================================
    // Event Metrics
    // ============================================================================

    /// Enrolment events accepted for processing, by kind
    pub static ref EVENTS_RECEIVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_received_total", METRIC_PREFIX),
        "Total enrolment events received",
        &["kind"]
    ).unwrap();

    /// Events that produced no message, by skip reason
    pub static ref EVENTS_SKIPPED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_skipped_total", METRIC_PREFIX),
        "Total enrolment events skipped without a notification",
        &["reason"]
    ).unwrap();

    // ============================================================================
    // Delivery Metrics
    // ============================================================================

    pub static ref NOTIFICATIONS_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_sent_total", METRIC_PREFIX),
        "Total notifications accepted by the transport",
        &["kind"]
    ).unwrap();

    /// Includes messages that rendered empty and were never handed to the transport
    pub static ref NOTIFICATIONS_FAILED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_failed_total", METRIC_PREFIX),
        "Total notifications that were not delivered",
        &["kind"]
    ).unwrap();

    /// Time from template selection to transport result
    pub static ref DISPATCH_LATENCY: Histogram = register_histogram!(
        format!("{}_dispatch_latency_seconds", METRIC_PREFIX),
        "Notification dispatch latency in seconds",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]
    ).unwrap();

    // ============================================================================
    // Redis Metrics
    // ============================================================================

    /// Redis connection status (1 = connected, 0 = disconnected)
    pub static ref REDIS_CONNECTION_STATUS: IntGauge = register_int_gauge!(
        format!("{}_redis_connection_status", METRIC_PREFIX),
        "Redis connection status (1=connected, 0=disconnected)"
    ).unwrap();

    /// Total Redis reconnection attempts
    pub static ref REDIS_RECONNECTIONS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_redis_reconnections_total", METRIC_PREFIX),
        "Total Redis reconnection attempts"
    ).unwrap();

    /// Redis pub/sub messages received
    pub static ref REDIS_MESSAGES_RECEIVED: IntCounter = register_int_counter!(
        format!("{}_redis_messages_received_total", METRIC_PREFIX),
        "Total messages received from Redis pub/sub"
    ).unwrap();
}
