// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Recovery coordinator: durable per-step lifecycle tracking.
//!
//! Initialization records the set of steps to track when a workflow
//! starts; updates arrive as the owning agent reports progress. The
//! read-back on init is what lets a restarted server or a freshly
//! connecting agent discover which steps are already done and skip
//! re-execution — identity is taken from the authenticated caller at
//! record-creation time, so a different agent can resume a crashed run.

use std::collections::HashMap;

use thiserror::Error;

use crank_core::{Clock, RecoveryRecord, RecoveryStatus, UnknownStatusCode};
use crank_storage::{SharedStore, StorageError};
use crank_wire::Metadata;

/// Coordinator failures.
///
/// Storage errors cross this boundary transparently so callers can match
/// on the original failure.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// The subsystem is switched off. Checked before any other work.
    #[error("step recovery is disabled")]
    Disabled,

    /// The call reached the coordinator without a gate-injected identity.
    #[error("caller identity missing from call metadata")]
    IdentityMissing,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatusCode),
}

/// Tracks step lifecycles through the storage collaborator.
///
/// No locking beyond what storage provides: concurrent updates to one
/// `(workflow_id, step_id)` pair are last-write-wins.
#[derive(Clone)]
pub struct RecoveryCoordinator<C: Clock> {
    store: SharedStore,
    clock: C,
    enabled: bool,
}

impl<C: Clock> RecoveryCoordinator<C> {
    pub fn new(store: SharedStore, clock: C, enabled: bool) -> Self {
        Self { store, clock, enabled }
    }

    /// Record the steps to track for a workflow and return its full
    /// recovery state keyed by step id.
    ///
    /// The returned map may already hold statuses beyond `Pending` when a
    /// prior attempt made progress before crashing.
    pub async fn init_workflow_recovery(
        &self,
        meta: &Metadata,
        workflow_id: &str,
        step_ids: &[String],
        ttl_secs: u64,
    ) -> Result<HashMap<String, RecoveryStatus>, RecoveryError> {
        if !self.enabled {
            return Err(RecoveryError::Disabled);
        }

        let agent_id = meta.agent_id().ok_or(RecoveryError::IdentityMissing)?;
        let agent = self.store.agent_find(agent_id).await?;

        self.store
            .recovery_create(workflow_id, step_ids, agent.id, ttl_secs)
            .await?;

        let records = self.store.recovery_get_all(workflow_id).await?;
        records
            .into_iter()
            .map(|r| {
                let status = r.status()?;
                Ok((r.step_id, status))
            })
            .collect()
    }

    /// Persist one step's reported progress.
    ///
    /// Builds a replacement record: `started_at` only for `Running`,
    /// `finished_at` (and `exit_code` on `Failed`) for terminal outcomes,
    /// no timestamps for `Pending`/`Skipped`. The previous record is
    /// overwritten wholesale — last transition wins.
    pub async fn update_step_recovery_state(
        &self,
        workflow_id: &str,
        step_id: &str,
        status: RecoveryStatus,
        exit_code: i64,
    ) -> Result<(), RecoveryError> {
        if !self.enabled {
            return Err(RecoveryError::Disabled);
        }

        let now = self.clock.epoch_secs();
        let record = RecoveryRecord::new(workflow_id, step_id).with_status(status);
        let record = match status {
            RecoveryStatus::Running => record.started_at(now),
            RecoveryStatus::Failed => record.finished_at(now).exit_code(exit_code),
            RecoveryStatus::Success => record.finished_at(now),
            RecoveryStatus::Pending | RecoveryStatus::Skipped => record,
        };

        self.store.recovery_update(record).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
