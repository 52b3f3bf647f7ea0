// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Agent identity.
//!
//! Agents are remote worker processes that execute pipeline steps. The
//! server is the authority for agent identity: numeric ids are assigned
//! by the storage layer at registration and carried on every subsequent
//! call as gate-injected call metadata.

use serde::{Deserialize, Serialize};

/// Numeric agent identity assigned by the server.
pub type AgentId = i64;

/// Identity hint presented by an agent that has not registered yet.
pub const UNREGISTERED_AGENT: AgentId = -1;

/// Registration record for one agent.
///
/// Owned by the storage collaborator; the coordination core only ever
/// references agents by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    /// Epoch seconds when the agent first registered.
    pub created_at: u64,
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
