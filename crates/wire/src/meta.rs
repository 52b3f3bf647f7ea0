// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Call metadata carried on every envelope.
//!
//! Metadata is the context the authorization gate operates on: it reads
//! the `token` entry and, on success, appends the verified `agent_id` so
//! downstream handlers never re-implement verification.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crank_core::AgentId;

/// Metadata key carrying the bearer token.
pub const META_TOKEN: &str = "token";

/// Metadata key carrying the gate-verified agent identity (decimal string).
pub const META_AGENT_ID: &str = "agent_id";

/// String key/value metadata attached to an inbound call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(HashMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// The bearer token, when present.
    pub fn token(&self) -> Option<&str> {
        self.get(META_TOKEN)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.insert(META_TOKEN, token);
        self
    }

    /// The gate-injected agent identity, when present and well-formed.
    pub fn agent_id(&self) -> Option<AgentId> {
        self.get(META_AGENT_ID).and_then(|s| s.parse().ok())
    }

    /// Append the verified agent identity as a decimal string.
    pub fn set_agent_id(&mut self, id: AgentId) {
        self.insert(META_AGENT_ID, id.to_string());
    }
}

#[cfg(test)]
#[path = "meta_tests.rs"]
mod tests;
