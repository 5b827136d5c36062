//! HTTP handlers for the webhook surface.
//!
//! Each handler unpacks the request, delegates to the coordinator and
//! returns JSON. Errors render through `ApiError`.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use fleetcfg_core::ConfigPayload;
use fleetcfg_metrics::MetricsSnapshot;
use fleetcfg_rollout::RolloutRecord;

use crate::ApiState;
use crate::coordinator::{RolloutStatusResponse, SendConfigResponse, ValidateResponse};
use crate::error::ApiResult;
use crate::extract::JsonBody;

/// GET /health body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
}

/// POST /send-config body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendConfigRequest {
    pub device_id: Option<String>,
    /// Config to deliver; an absent config is delivered as empty.
    #[serde(default)]
    pub config: ConfigPayload,
    /// Rollout to record the outcome against.
    pub rollout_id: Option<String>,
}

/// POST /rollout-status body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloutStatusRequest {
    pub rollout_id: Option<String>,
}

// ── Service ────────────────────────────────────────────────────

/// GET /health
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: state.service_name.to_string(),
    })
}

/// GET /metrics
pub async fn metrics(State(state): State<ApiState>) -> Json<MetricsSnapshot> {
    Json(state.coordinator.metrics_snapshot().await)
}

// ── Webhooks ───────────────────────────────────────────────────

/// POST /validate
pub async fn validate(
    State(state): State<ApiState>,
    JsonBody(payload): JsonBody<ConfigPayload>,
) -> ApiResult<Json<ValidateResponse>> {
    state.coordinator.handle_validate(payload).await.map(Json)
}

/// POST /send-config
pub async fn send_config(
    State(state): State<ApiState>,
    JsonBody(req): JsonBody<SendConfigRequest>,
) -> ApiResult<Json<SendConfigResponse>> {
    state
        .coordinator
        .handle_send_config(req.device_id, req.config, req.rollout_id)
        .await
        .map(Json)
}

/// POST /rollout-status
pub async fn rollout_status(
    State(state): State<ApiState>,
    JsonBody(req): JsonBody<RolloutStatusRequest>,
) -> ApiResult<Json<RolloutStatusResponse>> {
    state
        .coordinator
        .handle_rollout_status(req.rollout_id)
        .await
        .map(Json)
}

// ── Rollouts ───────────────────────────────────────────────────

/// GET /rollouts
pub async fn list_rollouts(State(state): State<ApiState>) -> Json<Vec<RolloutRecord>> {
    Json(state.coordinator.list_rollouts().await)
}

/// POST /rollouts/{id}/pause
pub async fn pause_rollout(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RolloutStatusResponse>> {
    state.coordinator.handle_pause(&id).await.map(Json)
}

/// POST /rollouts/{id}/resume
pub async fn resume_rollout(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RolloutStatusResponse>> {
    state.coordinator.handle_resume(&id).await.map(Json)
}

/// Unknown path or method: bare 404.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
