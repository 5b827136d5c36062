//! Device dispatcher — single-attempt delivery of a config to one device.
//!
//! No retries happen here. A failed delivery is reported to the caller,
//! which decides whether to try again.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use fleetcfg_core::{ConfigPayload, DeviceTarget, DispatchResult};

use crate::latency::{Latency, NoLatency};
use crate::policy::DeliveryPolicy;

/// Sends configs to devices through a delivery policy.
pub struct DeviceDispatcher {
    policy: Arc<dyn DeliveryPolicy>,
    latency: Arc<dyn Latency>,
    delivery_time: Duration,
}

impl DeviceDispatcher {
    /// Create a new dispatcher that waits `delivery_time` before each delivery.
    pub fn new(
        policy: Arc<dyn DeliveryPolicy>,
        latency: Arc<dyn Latency>,
        delivery_time: Duration,
    ) -> Self {
        Self {
            policy,
            latency,
            delivery_time,
        }
    }

    /// A dispatcher that answers without simulated network delay.
    pub fn immediate(policy: Arc<dyn DeliveryPolicy>) -> Self {
        Self::new(policy, Arc::new(NoLatency), Duration::ZERO)
    }

    /// Make one delivery attempt and report its outcome.
    pub async fn dispatch(&self, target: &DeviceTarget, config: &ConfigPayload) -> DispatchResult {
        let config_name = config.name_or_unknown();
        info!(device = %target.device_id, config = %config_name, "sending config to device");

        self.latency.wait(self.delivery_time).await;

        let delivered = self.policy.deliver(target, config);
        if delivered {
            info!(device = %target.device_id, config = %config_name, "config applied to device");
        } else {
            error!(device = %target.device_id, config = %config_name, "failed to apply config to device");
        }

        DispatchResult {
            device_id: target.device_id.clone(),
            delivered,
            config_name: config_name.to_string(),
        }
    }
}
