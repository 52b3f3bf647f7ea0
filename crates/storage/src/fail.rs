// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Test double that fails selected operations with a fixed error.

use async_trait::async_trait;

use crank_core::{Agent, AgentId, RecoveryRecord};

use crate::store::{StorageError, Store};
use crate::MemStore;

/// Which store operation should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOp {
    AgentFind,
    RecoveryCreate,
    RecoveryGetAll,
    RecoveryUpdate,
}

/// Wraps a [`MemStore`] and fails one operation with a configured error,
/// passing everything else through. Used to assert that storage errors
/// propagate to callers unchanged.
pub struct FailStore {
    inner: MemStore,
    op: FailOp,
    error: StorageError,
}

impl FailStore {
    pub fn new(op: FailOp, error: StorageError) -> Self {
        Self { inner: MemStore::new(), op, error }
    }

    pub fn store(&self) -> &MemStore {
        &self.inner
    }

    fn check(&self, op: FailOp) -> Result<(), StorageError> {
        if self.op == op {
            Err(self.error.clone())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for FailStore {
    async fn agent_find(&self, id: AgentId) -> Result<Agent, StorageError> {
        self.check(FailOp::AgentFind)?;
        self.inner.agent_find(id).await
    }

    async fn agent_create(&self, created_at: u64) -> Result<Agent, StorageError> {
        self.inner.agent_create(created_at).await
    }

    async fn recovery_create(
        &self,
        workflow_id: &str,
        step_ids: &[String],
        agent_id: AgentId,
        ttl_secs: u64,
    ) -> Result<(), StorageError> {
        self.check(FailOp::RecoveryCreate)?;
        self.inner.recovery_create(workflow_id, step_ids, agent_id, ttl_secs).await
    }

    async fn recovery_get_all(
        &self,
        workflow_id: &str,
    ) -> Result<Vec<RecoveryRecord>, StorageError> {
        self.check(FailOp::RecoveryGetAll)?;
        self.inner.recovery_get_all(workflow_id).await
    }

    async fn recovery_update(&self, record: RecoveryRecord) -> Result<(), StorageError> {
        self.check(FailOp::RecoveryUpdate)?;
        self.inner.recovery_update(record).await
    }
}
