// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! In-memory reference store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crank_core::{Agent, AgentId, RecoveryRecord, RecoveryStatus};

use crate::store::{StorageError, Store};

#[derive(Default)]
struct Inner {
    next_agent_id: AgentId,
    agents: HashMap<AgentId, Agent>,
    /// workflow_id → step_id → record. Last write wins per record.
    recovery: HashMap<String, HashMap<String, RecoveryRecord>>,
}

/// Mutex-guarded map store.
///
/// Every operation takes the lock once, so per-record atomicity holds; there
/// is no cross-call transaction, matching the guarantees the coordination
/// core is written against.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an agent with a chosen id, bypassing assignment.
    #[cfg(any(test, feature = "test-support"))]
    pub fn seed_agent(&self, id: AgentId, created_at: u64) {
        let mut inner = self.inner.lock();
        inner.next_agent_id = inner.next_agent_id.max(id);
        inner.agents.insert(id, Agent { id, created_at });
    }

    /// Drop recovery records whose TTL has elapsed.
    ///
    /// Deletion policy lives here, not in the coordinator: a record goes
    /// once its last activity is older than its TTL hint and every record
    /// in its workflow is terminal.
    pub fn prune_expired(&self, now_secs: u64) -> usize {
        let mut inner = self.inner.lock();
        let mut dropped = 0;
        inner.recovery.retain(|_, steps| {
            let workflow_done = steps.values().all(|r| {
                r.status().map(RecoveryStatus::is_terminal).unwrap_or(false)
            });
            if !workflow_done {
                return true;
            }
            steps.retain(|_, r| {
                if r.is_expired(now_secs) {
                    dropped += 1;
                    false
                } else {
                    true
                }
            });
            !steps.is_empty()
        });
        dropped
    }
}

#[async_trait]
impl Store for MemStore {
    async fn agent_find(&self, id: AgentId) -> Result<Agent, StorageError> {
        self.inner
            .lock()
            .agents
            .get(&id)
            .cloned()
            .ok_or(StorageError::AgentNotFound(id))
    }

    async fn agent_create(&self, created_at: u64) -> Result<Agent, StorageError> {
        let mut inner = self.inner.lock();
        inner.next_agent_id += 1;
        let agent = Agent { id: inner.next_agent_id, created_at };
        inner.agents.insert(agent.id, agent.clone());
        Ok(agent)
    }

    async fn recovery_create(
        &self,
        workflow_id: &str,
        step_ids: &[String],
        agent_id: AgentId,
        ttl_secs: u64,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        let steps = inner.recovery.entry(workflow_id.to_string()).or_default();
        for step_id in step_ids {
            steps
                .entry(step_id.clone())
                .and_modify(|existing| {
                    // Prior progress survives; the step is merely reclaimed.
                    existing.agent_id = agent_id;
                    existing.expiry = ttl_secs;
                })
                .or_insert_with(|| {
                    RecoveryRecord::new(workflow_id, step_id.as_str())
                        .agent_id(agent_id)
                        .expiry(ttl_secs)
                });
        }
        Ok(())
    }

    async fn recovery_get_all(
        &self,
        workflow_id: &str,
    ) -> Result<Vec<RecoveryRecord>, StorageError> {
        Ok(self
            .inner
            .lock()
            .recovery
            .get(workflow_id)
            .map(|steps| steps.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn recovery_update(&self, record: RecoveryRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        inner
            .recovery
            .entry(record.workflow_id.clone())
            .or_default()
            .insert(record.step_id.clone(), record);
        Ok(())
    }
}

#[cfg(test)]
#[path = "mem_tests.rs"]
mod tests;
