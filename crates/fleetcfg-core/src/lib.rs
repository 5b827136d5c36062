//! fleetcfg-core — shared data model and daemon configuration.
//!
//! The types here flow between the validator, the device dispatcher,
//! the rollout tracker and the HTTP layer. Field names serialize in
//! camelCase to match the webhook wire format.

pub mod config;
pub mod types;

pub use config::{
    ConfigError, ConfigResult, ControllerConfig, RolloutConfig, ServerConfig, SimulationConfig,
    StatusSynthesisKind,
};
pub use types::*;
