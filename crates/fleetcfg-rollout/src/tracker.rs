//! Rollout tracker — owns every `RolloutRecord`.
//!
//! The registry map is behind an `RwLock` and each record behind its own
//! `Mutex`, so writes to one rollout serialize without blocking others.
//! Callers only ever receive copies.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use fleetcfg_core::{DispatchResult, RolloutConfig};

use crate::error::{RolloutError, RolloutResult};
use crate::record::RolloutRecord;
use crate::synthesis::StatusSynthesis;

type Entry = Arc<Mutex<RolloutRecord>>;

/// Registry of every rollout this controller has seen.
pub struct RolloutTracker {
    records: RwLock<HashMap<String, Entry>>,
    synthesis: Arc<dyn StatusSynthesis>,
    total_steps: u32,
    total_devices: u32,
}

impl RolloutTracker {
    /// Create an empty tracker sized by the rollout section of the config.
    pub fn new(config: &RolloutConfig, synthesis: Arc<dyn StatusSynthesis>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            synthesis,
            total_steps: config.total_steps,
            total_devices: config.total_devices,
        }
    }

    /// Current record for a rollout, synthesizing one on first sight.
    pub async fn get_status(&self, rollout_id: &str) -> RolloutResult<RolloutRecord> {
        let id = validate_id(rollout_id)?;
        let entry = self
            .entry_or_insert_with(id, || {
                debug!(rollout = %id, "synthesizing status for unseen rollout");
                self.synthesis
                    .synthesize(id, self.total_steps, self.total_devices)
            })
            .await;
        let record = entry.lock().await.clone();
        Ok(record)
    }

    /// Apply one dispatch outcome to a rollout and return the updated record.
    ///
    /// A rollout with no record yet starts from zero delivered devices.
    pub async fn record_dispatch(
        &self,
        rollout_id: &str,
        result: &DispatchResult,
    ) -> RolloutResult<RolloutRecord> {
        let id = validate_id(rollout_id)?;
        let entry = self
            .entry_or_insert_with(id, || {
                RolloutRecord::new(id, self.total_steps, self.total_devices)
            })
            .await;
        let mut record = entry.lock().await;
        record.record_delivery(&result.device_id, result.delivered);
        Ok(record.clone())
    }

    /// Pause a progressing rollout. Other phases are returned unchanged.
    pub async fn pause(&self, rollout_id: &str) -> RolloutResult<RolloutRecord> {
        let entry = self.existing(rollout_id).await?;
        let mut record = entry.lock().await;
        record.pause();
        Ok(record.clone())
    }

    /// Resume a paused rollout. Other phases are returned unchanged.
    pub async fn resume(&self, rollout_id: &str) -> RolloutResult<RolloutRecord> {
        let entry = self.existing(rollout_id).await?;
        let mut record = entry.lock().await;
        record.resume();
        Ok(record.clone())
    }

    /// Snapshot of every tracked rollout, ordered by id.
    pub async fn list(&self) -> Vec<RolloutRecord> {
        let entries: Vec<Entry> = self.records.read().await.values().cloned().collect();
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            records.push(entry.lock().await.clone());
        }
        records.sort_by(|a, b| a.rollout_id.cmp(&b.rollout_id));
        records
    }

    /// Number of rollouts not yet completed.
    pub async fn active_count(&self) -> usize {
        self.list().await.iter().filter(|r| r.is_active()).count()
    }

    async fn existing(&self, rollout_id: &str) -> RolloutResult<Entry> {
        let id = validate_id(rollout_id)?;
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RolloutError::NotFound(id.to_string()))
    }

    async fn entry_or_insert_with(
        &self,
        id: &str,
        create: impl FnOnce() -> RolloutRecord,
    ) -> Entry {
        if let Some(entry) = self.records.read().await.get(id) {
            return Arc::clone(entry);
        }
        let mut records = self.records.write().await;
        Arc::clone(
            records
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(create()))),
        )
    }
}

/// Check a rollout id before it is used as a registry key.
///
/// Ids are keyed verbatim, so blank ids and ids with surrounding
/// whitespace are rejected rather than normalized.
pub fn validate_id(rollout_id: &str) -> RolloutResult<&str> {
    if rollout_id.trim().is_empty() || rollout_id.trim() != rollout_id {
        return Err(RolloutError::InvalidId(rollout_id.to_string()));
    }
    Ok(rollout_id)
}
