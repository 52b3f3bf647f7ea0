// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Inbound call types.

use serde::{Deserialize, Serialize};

use crank_core::{AgentId, RecoveryStatus, UNREGISTERED_AGENT};

use super::Metadata;

/// Method name of the bootstrap authentication call, the only method the
/// authorization gate lets through without a token.
pub const METHOD_REGISTER: &str = "register";

/// One inbound call: metadata plus the request proper.
///
/// `meta` is optional on the wire so a client that sends no metadata at
/// all is distinguishable from one that sends metadata without a token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Metadata>,
    pub request: Request,
}

impl Envelope {
    pub fn new(request: Request) -> Self {
        Self { meta: None, request }
    }

    pub fn with_meta(request: Request, meta: Metadata) -> Self {
        Self { meta: Some(meta), request }
    }
}

/// Request from an agent to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Bootstrap authentication: trade the long-lived shared secret for a
    /// fresh bearer token. `agent_id` of `-1` requests a new identity.
    Register {
        secret: String,
        #[serde(default = "unregistered")]
        agent_id: AgentId,
    },

    /// Record the set of steps to track for crash recovery and return any
    /// progress already on record for the workflow.
    InitWorkflowRecovery {
        workflow_id: String,
        step_ids: Vec<String>,
        /// TTL hint for record garbage collection, seconds.
        ttl_secs: u64,
    },

    /// Report one step's progress.
    UpdateStepRecoveryState {
        workflow_id: String,
        step_id: String,
        status: RecoveryStatus,
        #[serde(default)]
        exit_code: i64,
    },

    /// Connection-upgrading call: after `StreamReady`, the connection
    /// carries framed [`StepEvent`]s until the agent closes it.
    StepEventStream { workflow_id: String },
}

fn unregistered() -> AgentId {
    UNREGISTERED_AGENT
}

impl Request {
    /// Static method name, used by the authorization gate.
    pub fn method(&self) -> &'static str {
        match self {
            Request::Ping => "ping",
            Request::Register { .. } => METHOD_REGISTER,
            Request::InitWorkflowRecovery { .. } => "init_workflow_recovery",
            Request::UpdateStepRecoveryState { .. } => "update_step_recovery_state",
            Request::StepEventStream { .. } => "step_event_stream",
        }
    }
}

/// One frame of a [`Request::StepEventStream`] call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepEvent {
    pub step_id: String,
    pub status: RecoveryStatus,
    #[serde(default)]
    pub exit_code: i64,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
