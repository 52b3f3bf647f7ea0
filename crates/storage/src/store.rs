// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! The narrow storage interface consumed by the coordination core.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crank_core::{Agent, AgentId, RecoveryRecord};

/// Shared handle to a store implementation.
pub type SharedStore = Arc<dyn Store>;

/// Storage failures.
///
/// `PartialEq` so callers can assert on propagated errors: the coordinator
/// forwards these verbatim, never masking or wrapping them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Storage collaborator for agent identity and step recovery records.
///
/// Atomicity is per call: each operation either lands fully or not at all.
/// Concurrent updates to the same `(workflow_id, step_id)` pair are
/// serialized by the backend, last write wins; this layer exposes no
/// compare-and-swap.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Look up a registered agent by id.
    async fn agent_find(&self, id: AgentId) -> Result<Agent, StorageError>;

    /// Register a new agent and assign it a fresh numeric identity.
    async fn agent_create(&self, created_at: u64) -> Result<Agent, StorageError>;

    /// Create one `Pending` recovery record per step id, tagged with the
    /// claiming agent and TTL hint.
    ///
    /// A record that already exists for a pair (prior progress from a
    /// crashed attempt) keeps its status, timestamps, and exit code; only
    /// the claiming `agent_id` and TTL are retagged. This is what lets a
    /// re-initialized workflow discover finished steps on read-back.
    async fn recovery_create(
        &self,
        workflow_id: &str,
        step_ids: &[String],
        agent_id: AgentId,
        ttl_secs: u64,
    ) -> Result<(), StorageError>;

    /// All recovery records for a workflow, in unspecified order.
    async fn recovery_get_all(
        &self,
        workflow_id: &str,
    ) -> Result<Vec<RecoveryRecord>, StorageError>;

    /// Replace the record for `(record.workflow_id, record.step_id)`.
    async fn recovery_update(&self, record: RecoveryRecord) -> Result<(), StorageError>;
}
