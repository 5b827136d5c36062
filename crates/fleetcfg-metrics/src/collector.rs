//! Metrics collector — request and delivery counters.
//!
//! Uses a lock-free design with atomics for every counter, so recording
//! never contends with serving.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::host::{HostProbe, SimulatedHost};

/// Gauges reported by `GET /metrics`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Percent.
    pub cpu_usage: f64,
    /// Percent.
    pub memory_usage: f64,
    /// Mean response time in milliseconds.
    pub response_time: f64,
    /// Percentage of responses that were server errors.
    pub error_rate: f64,
    /// Requests per second since start.
    pub throughput: f64,
    /// Rollouts not yet completed.
    pub active_rollouts: u64,
    /// Successful device deliveries since start.
    pub devices_configured: u64,
}

/// Process-wide request and delivery counters.
pub struct MetricsCollector {
    started_at: Instant,
    request_count: AtomicU64,
    error_count: AtomicU64,
    /// Sum of request latencies in microseconds.
    latency_total_us: AtomicU64,
    devices_configured: AtomicU64,
    host: Arc<dyn HostProbe>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(Arc::new(SimulatedHost))
    }
}

impl MetricsCollector {
    /// Create a new metrics collector reading host gauges from `host`.
    pub fn new(host: Arc<dyn HostProbe>) -> Self {
        Self {
            started_at: Instant::now(),
            request_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            latency_total_us: AtomicU64::new(0),
            devices_configured: AtomicU64::new(0),
            host,
        }
    }

    /// Record a served request.
    pub fn record_request(&self, latency: Duration, is_error: bool) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if is_error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        let us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_total_us.fetch_add(us, Ordering::Relaxed);
    }

    /// Record the outcome of one device dispatch.
    pub fn record_delivery(&self, delivered: bool) {
        if delivered {
            self.devices_configured.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Build the `/metrics` view of the counters.
    pub fn snapshot(&self, active_rollouts: usize) -> MetricsSnapshot {
        let requests = self.request_count.load(Ordering::Relaxed);
        let errors = self.error_count.load(Ordering::Relaxed);
        let latency_us = self.latency_total_us.load(Ordering::Relaxed);

        let (response_time, error_rate) = if requests == 0 {
            (0.0, 0.0)
        } else {
            (
                latency_us as f64 / requests as f64 / 1000.0,
                errors as f64 / requests as f64 * 100.0,
            )
        };
        let uptime = self.started_at.elapsed().as_secs_f64().max(1.0);

        let snapshot = MetricsSnapshot {
            cpu_usage: self.host.cpu_usage(),
            memory_usage: self.host.memory_usage(),
            response_time,
            error_rate,
            throughput: requests as f64 / uptime,
            active_rollouts: active_rollouts as u64,
            devices_configured: self.devices_configured.load(Ordering::Relaxed),
        };
        debug!(requests, errors, "metrics snapshot taken");
        snapshot
    }
}
