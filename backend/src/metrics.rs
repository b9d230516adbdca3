//! Fulfillment counters served on `/metrics`.
//!
//! All counters are backed by atomics for lock-free concurrent access.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregated metrics for the VRF oracle backend.
///
/// Thread-safe via atomics; shared as `Arc<Metrics>`.
#[derive(Default)]
pub struct Metrics {
    /// Requests received from the listener (live or catch-up).
    pub requests_received: AtomicU64,
    /// Requests fulfilled on-chain.
    pub requests_fulfilled: AtomicU64,
    /// Requests already settled, cancelled or addressed to an unserved
    /// callback program when the fulfiller got to them.
    pub requests_skipped: AtomicU64,
    /// Fulfillment attempts that failed permanently.
    pub requests_failed: AtomicU64,
    /// Sum of fulfillment latencies in milliseconds.
    pub fulfillment_latency_sum_ms: AtomicU64,
}

/// Point-in-time copy of [`Metrics`], serialized as the `/metrics` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_received: u64,
    pub requests_fulfilled: u64,
    pub requests_skipped: u64,
    pub requests_failed: u64,
    pub avg_fulfillment_latency_ms: u64,
    pub total_fulfillment_latency_ms: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fulfillment(&self, latency_ms: u64) {
        self.requests_fulfilled.fetch_add(1, Ordering::Relaxed);
        self.fulfillment_latency_sum_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.requests_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Average fulfillment latency in milliseconds, or 0 if none.
    pub fn avg_latency_ms(&self) -> u64 {
        let count = self.requests_fulfilled.load(Ordering::Relaxed);
        if count == 0 {
            return 0;
        }
        self.fulfillment_latency_sum_ms.load(Ordering::Relaxed) / count
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_received: self.requests_received.load(Ordering::Relaxed),
            requests_fulfilled: self.requests_fulfilled.load(Ordering::Relaxed),
            requests_skipped: self.requests_skipped.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            avg_fulfillment_latency_ms: self.avg_latency_ms(),
            total_fulfillment_latency_ms: self.fulfillment_latency_sum_ms.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_latency_is_zero_without_fulfillments() {
        let metrics = Metrics::new();
        metrics.record_request();
        metrics.record_failure();
        assert_eq!(metrics.avg_latency_ms(), 0);
    }

    #[test]
    fn snapshot_reflects_recorded_events() {
        let metrics = Metrics::new();
        for _ in 0..4 {
            metrics.record_request();
        }
        metrics.record_fulfillment(100);
        metrics.record_fulfillment(300);
        metrics.record_skip();
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                requests_received: 4,
                requests_fulfilled: 2,
                requests_skipped: 1,
                requests_failed: 1,
                avg_fulfillment_latency_ms: 200,
                total_fulfillment_latency_ms: 400,
            }
        );

        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["avg_fulfillment_latency_ms"], 200);
    }
}
