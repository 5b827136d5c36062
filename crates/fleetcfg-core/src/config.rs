//! fleetcfgd configuration (`fleetcfg.toml`).
//!
//! Every field has a default so an empty file, or no file at all, yields
//! a working controller that behaves like the reference webhook service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level daemon configuration, loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub server: ServerConfig,
    pub simulation: SimulationConfig,
    pub rollout: RolloutConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
    /// Upper bound on validate/dispatch work for a single request.
    pub request_timeout_ms: u64,
    /// Name reported by `/health`.
    pub service_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_ms: 10_000,
            service_name: "config-controller".to_string(),
        }
    }
}

/// Knobs for the simulated validation and delivery backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated processing time per validation.
    pub validation_latency_ms: u64,
    /// Simulated network time per device delivery.
    pub dispatch_latency_ms: u64,
    /// Probability (0-1) that a structurally valid config is accepted.
    pub acceptance_rate: f64,
    /// Probability (0-1) that a device accepts a dispatched config.
    pub delivery_rate: f64,
    /// Record returned for a rollout queried before any dispatch.
    pub status_synthesis: StatusSynthesisKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            validation_latency_ms: 1000,
            dispatch_latency_ms: 2000,
            acceptance_rate: 0.9,
            delivery_rate: 0.95,
            status_synthesis: StatusSynthesisKind::Random,
        }
    }
}

/// How the tracker fills in a record for a rollout it has never seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSynthesisKind {
    /// Random phase with consistent counters.
    #[default]
    Random,
    /// Progressing, step 1, no devices completed.
    Fresh,
}

/// Shape of every rollout this controller tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    /// Number of steps a rollout is divided into.
    pub total_steps: u32,
    /// Number of devices a rollout must reach.
    pub total_devices: u32,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            total_steps: 3,
            total_devices: 10,
        }
    }
}

impl ControllerConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: ControllerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject rates outside `[0, 1]` and zero-sized rollouts or timeouts.
    pub fn validate(&self) -> ConfigResult<()> {
        let sim = &self.simulation;
        for (name, rate) in [
            ("acceptance_rate", sim.acceptance_rate),
            ("delivery_rate", sim.delivery_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Invalid(format!(
                    "simulation.{name} must be within [0, 1], got {rate}"
                )));
            }
        }
        if self.rollout.total_steps == 0 || self.rollout.total_devices == 0 {
            return Err(ConfigError::Invalid(
                "rollout.total_steps and rollout.total_devices must be positive".to_string(),
            ));
        }
        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "server.request_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Per-request bound on validate and dispatch work.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }
}

impl SimulationConfig {
    pub fn validation_latency(&self) -> Duration {
        Duration::from_millis(self.validation_latency_ms)
    }

    pub fn dispatch_latency(&self) -> Duration {
        Duration::from_millis(self.dispatch_latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ControllerConfig::from_toml("").unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.rollout.total_steps, 3);
        assert_eq!(config.server.service_name, "config-controller");
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let toml_str = r#"
[server]
port = 9090

[simulation]
delivery_rate = 1.0
status_synthesis = "fresh"
"#;
        let config = ControllerConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.simulation.delivery_rate, 1.0);
        assert_eq!(config.simulation.acceptance_rate, 0.9);
        assert_eq!(config.simulation.status_synthesis, StatusSynthesisKind::Fresh);
        assert_eq!(config.simulation.dispatch_latency(), Duration::from_secs(2));
    }

    #[test]
    fn rejects_rate_out_of_range() {
        let err = ControllerConfig::from_toml("[simulation]\nacceptance_rate = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_steps() {
        let err = ControllerConfig::from_toml("[rollout]\ntotal_steps = 0\n").unwrap_err();
        assert!(err.to_string().contains("total_steps"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = ControllerConfig::from_toml("[server\nport = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = ControllerConfig::from_file(Path::new("/nonexistent/fleetcfg.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
