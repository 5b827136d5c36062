//! Status synthesis — the record reported for a rollout never seen before.
//!
//! The tracker stores whatever the policy returns, so later queries for
//! the same id see the same record. A persisted backend can replace this
//! without changing the tracker's interface.

use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;

use fleetcfg_core::StatusSynthesisKind;

use crate::record::{RolloutPhase, RolloutRecord};

/// Produces the record for a rollout id the tracker has not seen.
pub trait StatusSynthesis: Send + Sync {
    fn synthesize(&self, rollout_id: &str, total_steps: u32, total_devices: u32) -> RolloutRecord;
}

/// Uniform phase, with step and device counters consistent with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSynthesis;

impl StatusSynthesis for RandomSynthesis {
    fn synthesize(&self, rollout_id: &str, total_steps: u32, total_devices: u32) -> RolloutRecord {
        let mut rng = rand::thread_rng();
        let phase = *RolloutPhase::ALL
            .choose(&mut rng)
            .unwrap_or(&RolloutPhase::Progressing);
        let completed = if total_devices > 1 {
            rng.gen_range(1..total_devices)
        } else {
            0
        };
        RolloutRecord::at(rollout_id, phase, completed, total_steps, total_devices)
    }
}

/// A rollout that has not started delivering yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreshSynthesis;

impl StatusSynthesis for FreshSynthesis {
    fn synthesize(&self, rollout_id: &str, total_steps: u32, total_devices: u32) -> RolloutRecord {
        RolloutRecord::new(rollout_id, total_steps, total_devices)
    }
}

impl<F> StatusSynthesis for F
where
    F: Fn(&str, u32, u32) -> RolloutRecord + Send + Sync,
{
    fn synthesize(&self, rollout_id: &str, total_steps: u32, total_devices: u32) -> RolloutRecord {
        self(rollout_id, total_steps, total_devices)
    }
}

/// Build the policy selected in configuration.
pub fn from_kind(kind: StatusSynthesisKind) -> Arc<dyn StatusSynthesis> {
    match kind {
        StatusSynthesisKind::Random => Arc::new(RandomSynthesis),
        StatusSynthesisKind::Fresh => Arc::new(FreshSynthesis),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn random_records_respect_invariants() {
        let mut phases = HashSet::new();
        for _ in 0..300 {
            let record = RandomSynthesis.synthesize("r-1", 3, 10);
            assert_eq!(record.rollout_id, "r-1");
            assert_eq!(record.total_steps, 3);
            assert_eq!(record.total_devices, 10);
            assert!((1..=3).contains(&record.current_step));
            assert!((1..=10).contains(&record.completed_devices));
            if record.phase == RolloutPhase::Completed {
                assert_eq!(record.current_step, 3);
                assert_eq!(record.completed_devices, 10);
            }
            phases.insert(record.phase);
        }
        // 300 uniform draws over three phases hit all of them.
        assert_eq!(phases.len(), 3);
    }

    #[test]
    fn fresh_record_is_untouched() {
        let record = FreshSynthesis.synthesize("r-2", 3, 10);
        assert_eq!(record, RolloutRecord::new("r-2", 3, 10));
    }

    #[test]
    fn from_kind_selects_policy() {
        let record = from_kind(StatusSynthesisKind::Fresh).synthesize("r-3", 3, 10);
        assert_eq!(record.completed_devices, 0);
    }
}
