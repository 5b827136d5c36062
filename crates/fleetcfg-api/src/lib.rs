//! fleetcfg-api — webhook API for the config controller.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/health` | Liveness and service name |
//! | GET | `/metrics` | JSON gauges |
//! | POST | `/validate` | Validate a configuration |
//! | POST | `/send-config` | Deliver a configuration to one device |
//! | POST | `/rollout-status` | Status of one rollout |
//! | GET | `/rollouts` | All tracked rollouts |
//! | POST | `/rollouts/{id}/pause` | Pause a rollout |
//! | POST | `/rollouts/{id}/resume` | Resume a paused rollout |
//!
//! Anything else answers 404 with an empty body.

pub mod coordinator;
pub mod error;
pub mod extract;
pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};

use fleetcfg_metrics::MetricsCollector;

pub use coordinator::{CoordinatorService, Status};
pub use error::{ApiError, ApiResult};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub coordinator: Arc<CoordinatorService>,
    pub metrics: Arc<MetricsCollector>,
    pub service_name: Arc<str>,
}

impl ApiState {
    /// Create a new API state.
    pub fn new(
        coordinator: Arc<CoordinatorService>,
        metrics: Arc<MetricsCollector>,
        service_name: &str,
    ) -> Self {
        Self {
            coordinator,
            metrics,
            service_name: Arc::from(service_name),
        }
    }
}

/// Every route served by [`build_router`]: method, path, summary.
pub const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "health check"),
    ("GET", "/metrics", "system metrics"),
    ("POST", "/validate", "validate configuration"),
    ("POST", "/send-config", "send config to device"),
    ("POST", "/rollout-status", "get rollout status"),
    ("GET", "/rollouts", "list tracked rollouts"),
    ("POST", "/rollouts/{id}/pause", "pause a rollout"),
    ("POST", "/rollouts/{id}/resume", "resume a paused rollout"),
];

/// Build the routing table.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/validate", post(handlers::validate))
        .route("/send-config", post(handlers::send_config))
        .route("/rollout-status", post(handlers::rollout_status))
        .route("/rollouts", get(handlers::list_rollouts))
        .route("/rollouts/{id}/pause", post(handlers::pause_rollout))
        .route("/rollouts/{id}/resume", post(handlers::resume_rollout))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), track_request))
        .with_state(state)
}

/// Feed every response into the metrics collector.
async fn track_request(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let resp = next.run(req).await;
    state
        .metrics
        .record_request(start.elapsed(), resp.status().is_server_error());
    resp
}
