//! Acceptance and delivery policies.
//!
//! Both decisions are pluggable so that tests can force either outcome
//! and production wiring can swap the random simulation for a real rule
//! engine or device agent. Any `Fn` with the right shape is a policy.

use rand::Rng;

use fleetcfg_core::{ConfigPayload, DeviceTarget};

/// Decides whether a structurally valid configuration is approved.
pub trait AcceptancePolicy: Send + Sync {
    fn accept(&self, payload: &ConfigPayload) -> bool;
}

impl<F> AcceptancePolicy for F
where
    F: Fn(&ConfigPayload) -> bool + Send + Sync,
{
    fn accept(&self, payload: &ConfigPayload) -> bool {
        self(payload)
    }
}

/// Decides whether a dispatch to a device succeeds.
pub trait DeliveryPolicy: Send + Sync {
    fn deliver(&self, target: &DeviceTarget, config: &ConfigPayload) -> bool;
}

impl<F> DeliveryPolicy for F
where
    F: Fn(&DeviceTarget, &ConfigPayload) -> bool + Send + Sync,
{
    fn deliver(&self, target: &DeviceTarget, config: &ConfigPayload) -> bool {
        self(target, config)
    }
}

/// Accepts with a fixed probability.
#[derive(Debug, Clone, Copy)]
pub struct RandomAcceptance {
    rate: f64,
}

impl RandomAcceptance {
    /// Create a policy that succeeds with probability `rate`.
    pub fn new(rate: f64) -> Self {
        Self {
            rate: probability(rate),
        }
    }
}

impl AcceptancePolicy for RandomAcceptance {
    fn accept(&self, _payload: &ConfigPayload) -> bool {
        rand::thread_rng().gen_bool(self.rate)
    }
}

/// Delivers with a fixed probability.
#[derive(Debug, Clone, Copy)]
pub struct RandomDelivery {
    rate: f64,
}

impl RandomDelivery {
    /// Create a policy that succeeds with probability `rate`.
    pub fn new(rate: f64) -> Self {
        Self {
            rate: probability(rate),
        }
    }
}

impl DeliveryPolicy for RandomDelivery {
    fn deliver(&self, _target: &DeviceTarget, _config: &ConfigPayload) -> bool {
        rand::thread_rng().gen_bool(self.rate)
    }
}

/// Clamp into `[0, 1]`; a non-finite rate never succeeds.
fn probability(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Always returns the wrapped verdict.
#[derive(Debug, Clone, Copy)]
pub struct FixedAcceptance(pub bool);

impl AcceptancePolicy for FixedAcceptance {
    fn accept(&self, _payload: &ConfigPayload) -> bool {
        self.0
    }
}

/// Always returns the wrapped outcome.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelivery(pub bool);

impl DeliveryPolicy for FixedDelivery {
    fn deliver(&self, _target: &DeviceTarget, _config: &ConfigPayload) -> bool {
        self.0
    }
}
