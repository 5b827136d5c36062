//! Rollout record — drives the rollout phase state machine.
//!
//! ```text
//! Progressing ──(all devices accounted)──▶ Completed
//!      │  ▲                                   ▲
//!  pause  resume                              │
//!      ▼  │                                   │
//!    Paused ───────(all devices accounted)────┘
//! ```
//!
//! Devices are split evenly across steps. `current_step` follows the
//! number of completed devices and never moves backwards.

use tracing::{debug, info};

/// Coarse state of a rollout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RolloutPhase {
    Progressing,
    /// Held by an operator. Deliveries still count.
    Paused,
    /// Every device has received the configuration.
    Completed,
}

impl RolloutPhase {
    pub const ALL: [RolloutPhase; 3] = [Self::Progressing, Self::Paused, Self::Completed];

    fn verb(self) -> &'static str {
        match self {
            Self::Progressing => "progressing",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

/// State of one rollout.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloutRecord {
    pub rollout_id: String,
    pub phase: RolloutPhase,
    /// 1-based, within `[1, total_steps]`.
    pub current_step: u32,
    pub total_steps: u32,
    /// Devices that have successfully taken the config.
    pub completed_devices: u32,
    pub total_devices: u32,
}

impl RolloutRecord {
    /// A rollout that has not delivered to any device yet.
    pub fn new(rollout_id: &str, total_steps: u32, total_devices: u32) -> Self {
        Self {
            rollout_id: rollout_id.to_string(),
            phase: RolloutPhase::Progressing,
            current_step: 1,
            total_steps: total_steps.max(1),
            completed_devices: 0,
            total_devices: total_devices.max(1),
        }
    }

    /// A record `completed_devices` into the rollout, in the given phase.
    ///
    /// `Completed` forces every device to be accounted for; the other
    /// phases keep at least one device outstanding.
    pub fn at(
        rollout_id: &str,
        phase: RolloutPhase,
        completed_devices: u32,
        total_steps: u32,
        total_devices: u32,
    ) -> Self {
        let mut record = Self::new(rollout_id, total_steps, total_devices);
        match phase {
            RolloutPhase::Completed => {
                record.completed_devices = record.total_devices;
                record.current_step = record.total_steps;
            }
            RolloutPhase::Progressing | RolloutPhase::Paused => {
                record.completed_devices = completed_devices.min(record.total_devices - 1);
                record.current_step = record.step_for(record.completed_devices);
            }
        }
        record.phase = phase;
        record
    }

    /// Number of devices that make up one step.
    pub fn devices_per_step(&self) -> u32 {
        self.total_devices.div_ceil(self.total_steps).max(1)
    }

    fn step_for(&self, completed: u32) -> u32 {
        (completed / self.devices_per_step() + 1).min(self.total_steps)
    }

    /// Whether the rollout still has work left.
    pub fn is_active(&self) -> bool {
        self.phase != RolloutPhase::Completed
    }

    pub fn all_devices_accounted(&self) -> bool {
        self.completed_devices >= self.total_devices
    }

    /// Apply one dispatch outcome. Returns true if the record changed.
    pub fn record_delivery(&mut self, device_id: &str, delivered: bool) -> bool {
        if !delivered {
            debug!(rollout = %self.rollout_id, device = %device_id, "failed dispatch not counted");
            return false;
        }
        if self.all_devices_accounted() {
            debug!(
                rollout = %self.rollout_id,
                device = %device_id,
                "all devices already accounted, ignoring delivery"
            );
            return false;
        }

        self.completed_devices += 1;

        let step = self.step_for(self.completed_devices);
        if step > self.current_step {
            self.current_step = step;
            debug!(
                rollout = %self.rollout_id,
                step,
                total = self.total_steps,
                "advancing to next step"
            );
        }

        if self.all_devices_accounted() {
            self.current_step = self.total_steps;
            self.phase = RolloutPhase::Completed;
            info!(rollout = %self.rollout_id, devices = self.total_devices, "rollout completed");
        }
        true
    }

    /// Hold the rollout. Only a progressing rollout can be paused.
    pub fn pause(&mut self) -> bool {
        if self.phase != RolloutPhase::Progressing {
            return false;
        }
        info!(rollout = %self.rollout_id, step = self.current_step, "pausing rollout");
        self.phase = RolloutPhase::Paused;
        true
    }

    /// Continue a paused rollout.
    pub fn resume(&mut self) -> bool {
        if self.phase != RolloutPhase::Paused {
            return false;
        }
        info!(rollout = %self.rollout_id, step = self.current_step, "resuming rollout");
        self.phase = RolloutPhase::Progressing;
        true
    }

    /// Human-readable one-liner for status responses.
    pub fn status_message(&self) -> String {
        format!("Rollout {} is {}", self.rollout_id, self.phase.verb())
    }
}
