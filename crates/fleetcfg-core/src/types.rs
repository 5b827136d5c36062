//! Configuration payloads, device targets and per-operation outcomes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Minimum `configVersion` length for a payload to be eligible for validation.
pub const MIN_CONFIG_VERSION_LEN: usize = 3;

/// Placeholder reported for absent string fields.
pub const UNKNOWN: &str = "unknown";

/// A configuration payload submitted for validation or delivery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPayload {
    /// Version tag; must be at least three characters to pass validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_version: Option<String>,
    /// Human-readable configuration name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Remaining key/value body, passed through untouched.
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl ConfigPayload {
    /// Create a payload carrying only a version.
    pub fn new(config_version: &str) -> Self {
        Self {
            config_version: Some(config_version.to_string()),
            ..Default::default()
        }
    }

    /// Set the configuration name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// The version, or `"unknown"` when absent.
    pub fn version_or_unknown(&self) -> &str {
        self.config_version.as_deref().unwrap_or(UNKNOWN)
    }

    /// The name, or `"unknown"` when absent.
    pub fn name_or_unknown(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN)
    }

    /// Whether the version passes the structural check.
    pub fn has_eligible_version(&self) -> bool {
        self.config_version
            .as_deref()
            .is_some_and(|v| v.chars().count() >= MIN_CONFIG_VERSION_LEN)
    }
}

/// The recipient of a dispatch. Opaque, caller-supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTarget {
    pub device_id: String,
}

impl DeviceTarget {
    /// Create a target for `device_id`.
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
        }
    }
}

/// Verdict of the validator for one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub accepted: bool,
    /// Why the payload was accepted or rejected.
    pub reason: String,
    pub config_version: String,
}

impl ValidationResult {
    /// Create an accepting verdict.
    pub fn accepted(config_version: &str) -> Self {
        Self {
            accepted: true,
            reason: "accepted by policy".to_string(),
            config_version: config_version.to_string(),
        }
    }

    /// Create a rejecting verdict with `reason`.
    pub fn rejected(config_version: &str, reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: reason.into(),
            config_version: config_version.to_string(),
        }
    }
}

/// Outcome of delivering one configuration to one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub device_id: String,
    /// Whether the device took the config.
    pub delivered: bool,
    /// Name of the delivered config, or `"unknown"`.
    pub config_name: String,
}
