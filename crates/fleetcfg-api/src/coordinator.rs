//! Coordinator service — sequences validator, dispatcher and tracker.
//!
//! Holds handles to its collaborators and no state of its own. Validation
//! and dispatch run as spawned tasks bounded by the request timeout: a
//! stalled operation is aborted and reported as a timeout, and rollout
//! state is only touched after a dispatch has finished, on a task that
//! outlives the request.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use fleetcfg_core::{ConfigPayload, ControllerConfig, DeviceTarget, DispatchResult};
use fleetcfg_delivery::{
    ConfigValidator, DeviceDispatcher, RandomAcceptance, RandomDelivery, TokioLatency,
};
use fleetcfg_metrics::{MetricsCollector, MetricsSnapshot};
use fleetcfg_rollout::{RolloutRecord, RolloutResult, RolloutTracker, synthesis, validate_id};

use crate::error::{ApiError, ApiResult};

/// Outcome marker carried in every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
    Error,
}

/// Body of a successful `/validate` call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub status: Status,
    pub message: String,
    pub config_version: String,
}

/// Body of a successful `/send-config` call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendConfigResponse {
    pub status: Status,
    pub message: String,
    pub device_id: String,
    pub config_name: String,
    /// Rollout state after this dispatch, when a rollout id was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollout: Option<RolloutRecord>,
}

/// A rollout record plus a readable summary.
#[derive(Debug, Serialize)]
pub struct RolloutStatusResponse {
    #[serde(flatten)]
    pub record: RolloutRecord,
    pub message: String,
}

impl From<RolloutRecord> for RolloutStatusResponse {
    fn from(record: RolloutRecord) -> Self {
        let message = record.status_message();
        Self { record, message }
    }
}

/// Sequences validation, dispatch and rollout tracking for the handlers.
pub struct CoordinatorService {
    validator: Arc<ConfigValidator>,
    dispatcher: Arc<DeviceDispatcher>,
    tracker: Arc<RolloutTracker>,
    metrics: Arc<MetricsCollector>,
    request_timeout: Duration,
}

impl CoordinatorService {
    /// Create a coordinator from explicit collaborators.
    pub fn new(
        validator: Arc<ConfigValidator>,
        dispatcher: Arc<DeviceDispatcher>,
        tracker: Arc<RolloutTracker>,
        metrics: Arc<MetricsCollector>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            validator,
            dispatcher,
            tracker,
            metrics,
            request_timeout,
        }
    }

    /// Production wiring: random policies and real (non-blocking) latency.
    pub fn from_config(config: &ControllerConfig, metrics: Arc<MetricsCollector>) -> Self {
        let sim = &config.simulation;
        let validator = ConfigValidator::new(
            Arc::new(RandomAcceptance::new(sim.acceptance_rate)),
            Arc::new(TokioLatency),
            sim.validation_latency(),
        );
        let dispatcher = DeviceDispatcher::new(
            Arc::new(RandomDelivery::new(sim.delivery_rate)),
            Arc::new(TokioLatency),
            sim.dispatch_latency(),
        );
        let tracker = RolloutTracker::new(&config.rollout, synthesis::from_kind(sim.status_synthesis));
        Self::new(
            Arc::new(validator),
            Arc::new(dispatcher),
            Arc::new(tracker),
            metrics,
            config.request_timeout(),
        )
    }

    /// Validate a config against the structural rule and the acceptance
    /// policy.
    pub async fn handle_validate(&self, payload: ConfigPayload) -> ApiResult<ValidateResponse> {
        let validator = Arc::clone(&self.validator);
        let result = self
            .bounded("validation", async move { validator.validate(&payload).await })
            .await?;

        if result.accepted {
            Ok(ValidateResponse {
                status: Status::Success,
                message: "Configuration validation passed".to_string(),
                config_version: result.config_version,
            })
        } else {
            info!(config_version = %result.config_version, reason = %result.reason, "validation rejected");
            Err(ApiError::ValidationRejected {
                config_version: result.config_version,
                reason: result.reason,
            })
        }
    }

    /// Dispatch a config to one device, recording the outcome against
    /// `rollout_id` when given.
    ///
    /// The outcome is committed on the dispatch task itself, so a caller
    /// that goes away mid-dispatch does not lose a delivery.
    pub async fn handle_send_config(
        &self,
        device_id: Option<String>,
        config: ConfigPayload,
        rollout_id: Option<String>,
    ) -> ApiResult<SendConfigResponse> {
        let device_id = device_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::ClientInput("deviceId is required".to_string()))?;
        if let Some(id) = &rollout_id {
            validate_id(id)?;
        }

        let target = DeviceTarget::new(&device_id);
        let dispatcher = Arc::clone(&self.dispatcher);
        let tracker = Arc::clone(&self.tracker);
        let metrics = Arc::clone(&self.metrics);
        let committed = self
            .bounded("dispatch", async move {
                let result = dispatcher.dispatch(&target, &config).await;
                // Not aborted with the dispatch: a finished delivery is always committed.
                tokio::spawn(commit_dispatch(tracker, metrics, result, rollout_id)).await
            })
            .await?;
        let (result, rollout) = match committed {
            Ok(outcome) => outcome?,
            Err(e) => {
                error!(error = %e, "dispatch commit task failed");
                return Err(ApiError::Internal(format!("dispatch failed: {e}")));
            }
        };

        if result.delivered {
            Ok(SendConfigResponse {
                status: Status::Success,
                message: format!("Configuration sent to device {}", result.device_id),
                device_id: result.device_id,
                config_name: result.config_name,
                rollout,
            })
        } else {
            Err(ApiError::DispatchFailed {
                device_id: result.device_id,
                rollout,
            })
        }
    }

    /// Current status of a rollout, synthesized on first query.
    pub async fn handle_rollout_status(
        &self,
        rollout_id: Option<String>,
    ) -> ApiResult<RolloutStatusResponse> {
        let rollout_id =
            rollout_id.ok_or_else(|| ApiError::ClientInput("rolloutId is required".to_string()))?;
        let record = self.tracker.get_status(&rollout_id).await?;
        Ok(record.into())
    }

    /// Pause a tracked rollout.
    pub async fn handle_pause(&self, rollout_id: &str) -> ApiResult<RolloutStatusResponse> {
        Ok(self.tracker.pause(rollout_id).await?.into())
    }

    /// Resume a tracked rollout.
    pub async fn handle_resume(&self, rollout_id: &str) -> ApiResult<RolloutStatusResponse> {
        Ok(self.tracker.resume(rollout_id).await?.into())
    }

    /// Every tracked rollout, ordered by id.
    pub async fn list_rollouts(&self) -> Vec<RolloutRecord> {
        self.tracker.list().await
    }

    /// Metrics snapshot including the current active-rollout gauge.
    pub async fn metrics_snapshot(&self) -> MetricsSnapshot {
        let active = self.tracker.active_count().await;
        self.metrics.snapshot(active)
    }

    /// Run `work` on its own task, bounded by the request timeout.
    async fn bounded<T, F>(&self, operation: &'static str, work: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let mut handle = tokio::spawn(work);
        match tokio::time::timeout(self.request_timeout, &mut handle).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!(operation, error = %e, "operation task failed");
                Err(ApiError::Internal(format!("{operation} failed: {e}")))
            }
            Err(_) => {
                handle.abort();
                let timeout_ms = u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(operation, timeout_ms, "operation timed out, aborted");
                Err(ApiError::Timeout {
                    operation,
                    timeout_ms,
                })
            }
        }
    }
}

/// Record one finished dispatch in the metrics and, when given, the rollout.
async fn commit_dispatch(
    tracker: Arc<RolloutTracker>,
    metrics: Arc<MetricsCollector>,
    result: DispatchResult,
    rollout_id: Option<String>,
) -> RolloutResult<(DispatchResult, Option<RolloutRecord>)> {
    metrics.record_delivery(result.delivered);
    let rollout = match rollout_id {
        Some(id) => Some(tracker.record_dispatch(&id, &result).await?),
        None => None,
    };
    Ok((result, rollout))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fleetcfg_core::RolloutConfig;
    use fleetcfg_delivery::{FixedAcceptance, FixedDelivery, Latency};
    use fleetcfg_metrics::FixedHost;
    use fleetcfg_rollout::{FreshSynthesis, RolloutPhase};

    use super::*;

    fn coordinator_with(
        validator: ConfigValidator,
        dispatcher: DeviceDispatcher,
        timeout: Duration,
    ) -> CoordinatorService {
        CoordinatorService::new(
            Arc::new(validator),
            Arc::new(dispatcher),
            Arc::new(RolloutTracker::new(
                &RolloutConfig::default(),
                Arc::new(FreshSynthesis),
            )),
            Arc::new(MetricsCollector::new(Arc::new(FixedHost {
                cpu: 0.0,
                memory: 0.0,
            }))),
            timeout,
        )
    }

    fn coordinator(accept: bool, deliver: bool) -> CoordinatorService {
        coordinator_with(
            ConfigValidator::immediate(Arc::new(FixedAcceptance(accept))),
            DeviceDispatcher::immediate(Arc::new(FixedDelivery(deliver))),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn validate_success_and_rejection() {
        let ok = coordinator(true, true)
            .handle_validate(ConfigPayload::new("v1.2.3"))
            .await
            .unwrap();
        assert_eq!(ok.status, Status::Success);
        assert_eq!(ok.config_version, "v1.2.3");

        let err = coordinator(false, true)
            .handle_validate(ConfigPayload::new("v1.2.3"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationRejected { .. }));
    }

    #[tokio::test]
    async fn send_config_requires_device_id() {
        let c = coordinator(true, true);
        for device in [None, Some(String::new()), Some("  ".to_string())] {
            let err = c
                .handle_send_config(device, ConfigPayload::default(), None)
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::ClientInput(_)));
        }
    }

    #[tokio::test]
    async fn send_config_without_rollout_leaves_tracker_untouched() {
        let c = coordinator(true, true);
        let resp = c
            .handle_send_config(Some("dev-1".into()), ConfigPayload::default().with_name("n"), None)
            .await
            .unwrap();
        assert_eq!(resp.config_name, "n");
        assert!(resp.rollout.is_none());
        assert!(c.list_rollouts().await.is_empty());
    }

    #[tokio::test]
    async fn send_config_records_against_rollout() {
        let c = coordinator(true, true);
        for i in 0..4 {
            c.handle_send_config(
                Some(format!("dev-{i}")),
                ConfigPayload::default(),
                Some("r-1".into()),
            )
            .await
            .unwrap();
        }
        let status = c.handle_rollout_status(Some("r-1".into())).await.unwrap();
        assert_eq!(status.record.completed_devices, 4);
        assert_eq!(status.record.current_step, 2);
    }

    #[tokio::test]
    async fn failed_dispatch_is_reported_with_rollout() {
        let c = coordinator(true, false);
        let err = c
            .handle_send_config(Some("dev-42".into()), ConfigPayload::default(), Some("r-1".into()))
            .await
            .unwrap_err();
        match err {
            ApiError::DispatchFailed { device_id, rollout } => {
                assert_eq!(device_id, "dev-42");
                assert_eq!(rollout.unwrap().completed_devices, 0);
            }
            other => panic!("expected DispatchFailed, got {other:?}"),
        }
    }

    struct Forever;

    #[async_trait::async_trait]
    impl Latency for Forever {
        async fn wait(&self, _duration: Duration) {
            std::future::pending::<()>().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_dispatch_times_out_without_recording() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&delivered);
        let dispatcher = DeviceDispatcher::new(
            Arc::new(move |_: &DeviceTarget, _: &ConfigPayload| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }),
            Arc::new(Forever),
            Duration::ZERO,
        );
        let c = coordinator_with(
            ConfigValidator::immediate(Arc::new(FixedAcceptance(true))),
            dispatcher,
            Duration::from_millis(50),
        );

        let err = c
            .handle_send_config(Some("dev-1".into()), ConfigPayload::default(), Some("r-1".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Timeout { operation: "dispatch", .. }));
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
        assert!(c.list_rollouts().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_outcome_survives_dropped_caller() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&delivered);
        let dispatcher = DeviceDispatcher::new(
            Arc::new(move |_: &DeviceTarget, _: &ConfigPayload| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }),
            Arc::new(TokioLatency),
            Duration::from_secs(2),
        );
        let c = coordinator_with(
            ConfigValidator::immediate(Arc::new(FixedAcceptance(true))),
            dispatcher,
            Duration::from_secs(10),
        );

        // Caller gives up after 1s, halfway through the dispatch.
        let abandoned = tokio::time::timeout(
            Duration::from_secs(1),
            c.handle_send_config(Some("dev-1".into()), ConfigPayload::default(), Some("r-1".into())),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        let rollouts = c.list_rollouts().await;
        assert_eq!(rollouts.len(), 1);
        assert_eq!(rollouts[0].rollout_id, "r-1");
        assert_eq!(rollouts[0].completed_devices, 1);
        assert_eq!(c.metrics_snapshot().await.devices_configured, 1);
    }

    #[tokio::test]
    async fn padded_rollout_id_is_rejected_before_dispatch() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&delivered);
        let c = coordinator_with(
            ConfigValidator::immediate(Arc::new(FixedAcceptance(true))),
            DeviceDispatcher::immediate(Arc::new(move |_: &DeviceTarget, _: &ConfigPayload| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            })),
            Duration::from_secs(5),
        );
        for id in ["", "  ", " r-1"] {
            let err = c
                .handle_send_config(Some("dev-1".into()), ConfigPayload::default(), Some(id.into()))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::ClientInput(_)));
        }
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
        assert!(c.list_rollouts().await.is_empty());
    }

    #[tokio::test]
    async fn panicking_policy_is_internal_fault() {
        let c = coordinator_with(
            ConfigValidator::immediate(Arc::new(|_: &ConfigPayload| -> bool {
                panic!("rule engine unavailable")
            })),
            DeviceDispatcher::immediate(Arc::new(FixedDelivery(true))),
            Duration::from_secs(5),
        );
        let err = c.handle_validate(ConfigPayload::new("v1.0")).await.unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[tokio::test]
    async fn rollout_status_requires_id() {
        let c = coordinator(true, true);
        assert!(matches!(
            c.handle_rollout_status(None).await.unwrap_err(),
            ApiError::ClientInput(_)
        ));
        assert!(matches!(
            c.handle_rollout_status(Some(" ".into())).await.unwrap_err(),
            ApiError::ClientInput(_)
        ));
    }

    #[tokio::test]
    async fn pause_resume_through_coordinator() {
        let c = coordinator(true, true);
        c.handle_rollout_status(Some("r-1".into())).await.unwrap();
        let paused = c.handle_pause("r-1").await.unwrap();
        assert_eq!(paused.record.phase, RolloutPhase::Paused);
        assert_eq!(paused.message, "Rollout r-1 is paused");
        let resumed = c.handle_resume("r-1").await.unwrap();
        assert_eq!(resumed.record.phase, RolloutPhase::Progressing);
    }

    #[tokio::test]
    async fn metrics_count_configured_devices_and_active_rollouts() {
        let c = coordinator(true, true);
        c.handle_send_config(Some("d1".into()), ConfigPayload::default(), Some("r-1".into()))
            .await
            .unwrap();
        let snap = c.metrics_snapshot().await;
        assert_eq!(snap.devices_configured, 1);
        assert_eq!(snap.active_rollouts, 1);
    }
}
