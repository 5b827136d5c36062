//! Configuration validator.
//!
//! A payload is rejected outright when its `configVersion` is absent or
//! shorter than three characters. Otherwise the acceptance policy has
//! the final word.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use fleetcfg_core::{ConfigPayload, MIN_CONFIG_VERSION_LEN, ValidationResult};

use crate::latency::{Latency, NoLatency};
use crate::policy::AcceptancePolicy;

/// Structural check followed by an acceptance policy.
pub struct ConfigValidator {
    policy: Arc<dyn AcceptancePolicy>,
    latency: Arc<dyn Latency>,
    processing_time: Duration,
}

impl ConfigValidator {
    /// Create a new validator that spends `processing_time` on each config.
    pub fn new(
        policy: Arc<dyn AcceptancePolicy>,
        latency: Arc<dyn Latency>,
        processing_time: Duration,
    ) -> Self {
        Self {
            policy,
            latency,
            processing_time,
        }
    }

    /// A validator that answers without simulated processing time.
    pub fn immediate(policy: Arc<dyn AcceptancePolicy>) -> Self {
        Self::new(policy, Arc::new(NoLatency), Duration::ZERO)
    }

    /// Validate one payload. Never fails; rejection is part of the result.
    pub async fn validate(&self, payload: &ConfigPayload) -> ValidationResult {
        let version = payload.version_or_unknown();
        info!(config_version = %version, "validating config");

        self.latency.wait(self.processing_time).await;

        if !payload.has_eligible_version() {
            let reason = match payload.config_version {
                None => "configVersion is missing".to_string(),
                Some(_) => format!(
                    "configVersion must be at least {MIN_CONFIG_VERSION_LEN} characters"
                ),
            };
            debug!(config_version = %version, %reason, "config failed structural check");
            return ValidationResult::rejected(version, reason);
        }

        if self.policy.accept(payload) {
            debug!(config_version = %version, "config accepted");
            ValidationResult::accepted(version)
        } else {
            debug!(config_version = %version, "config rejected by acceptance policy");
            ValidationResult::rejected(version, "rejected by acceptance policy")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::latency::TokioLatency;
    use crate::policy::FixedAcceptance;

    fn validator(accept: bool) -> ConfigValidator {
        ConfigValidator::immediate(Arc::new(FixedAcceptance(accept)))
    }

    #[tokio::test]
    async fn short_or_missing_version_always_rejected() {
        for accept in [true, false] {
            let v = validator(accept);
            for payload in [
                ConfigPayload::default(),
                ConfigPayload::new(""),
                ConfigPayload::new("x"),
                ConfigPayload::new("v1"),
            ] {
                let result = v.validate(&payload).await;
                assert!(!result.accepted, "{payload:?} accepted with policy={accept}");
            }
        }
    }

    #[tokio::test]
    async fn missing_version_reports_unknown() {
        let result = validator(true).validate(&ConfigPayload::default()).await;
        assert_eq!(result.config_version, "unknown");
        assert_eq!(result.reason, "configVersion is missing");
    }

    #[tokio::test]
    async fn eligible_version_follows_policy() {
        let payload = ConfigPayload::new("v1.2.3");

        let result = validator(true).validate(&payload).await;
        assert!(result.accepted);
        assert_eq!(result.config_version, "v1.2.3");

        let result = validator(false).validate(&payload).await;
        assert!(!result.accepted);
        assert_eq!(result.reason, "rejected by acceptance policy");
    }

    #[tokio::test]
    async fn policy_not_consulted_for_structural_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let v = ConfigValidator::immediate(Arc::new(move |_: &ConfigPayload| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        }));

        v.validate(&ConfigPayload::new("x")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        v.validate(&ConfigPayload::new("v1.0")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn processing_time_is_simulated() {
        let v = ConfigValidator::new(
            Arc::new(FixedAcceptance(true)),
            Arc::new(TokioLatency),
            Duration::from_secs(1),
        );
        let start = tokio::time::Instant::now();
        v.validate(&ConfigPayload::new("v1.0")).await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}
