//! Simulated latency.
//!
//! Validation and delivery model real I/O wait. The wait must suspend the
//! calling task rather than block a worker thread.

use std::time::Duration;

use async_trait::async_trait;

/// Source of simulated I/O delay.
#[async_trait]
pub trait Latency: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Suspends on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLatency;

#[async_trait]
impl Latency for TokioLatency {
    async fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Returns immediately. Used in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLatency;

#[async_trait]
impl Latency for NoLatency {
    async fn wait(&self, _duration: Duration) {}
}
