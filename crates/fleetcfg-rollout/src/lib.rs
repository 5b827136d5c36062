//! fleetcfg rollout tracking — phases, steps, per-device completion.
//!
//! A rollout distributes one configuration to a fixed number of devices
//! over a fixed number of steps. Successful dispatches advance it; an
//! operator can pause and resume it.
//!
//! # Components
//!
//! - **`record`** — `RolloutRecord` and its phase state machine
//! - **`tracker`** — the registry of in-flight rollouts (single writer per id)
//! - **`synthesis`** — what a status query returns for a rollout never seen before

pub mod error;
pub mod record;
pub mod synthesis;
pub mod tracker;

pub use error::{RolloutError, RolloutResult};
pub use record::{RolloutPhase, RolloutRecord};
pub use synthesis::{FreshSynthesis, RandomSynthesis, StatusSynthesis};
pub use tracker::{RolloutTracker, validate_id};
