// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Responses from the daemon.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crank_core::{AgentId, RecoveryStatus};

/// Failure category, so clients can tell authentication failures apart
/// from application errors without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Missing/invalid token or rejected registration. The agent must
    /// re-run the bootstrap call before retrying.
    Unauthenticated,
    /// The recovery subsystem is switched off. Callers treat this as
    /// "recovery unavailable", not as a fatal pipeline error.
    RecoveryDisabled,
    /// Anything else, including propagated storage failures.
    Internal,
}

crank_core::simple_display! {
    ErrorCode {
        Unauthenticated => "unauthenticated",
        RecoveryDisabled => "recovery_disabled",
        Internal => "internal",
    }
}

/// Response from the daemon to an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Health check response
    Pong,

    /// Bootstrap authentication succeeded
    Registered { token: String, agent_id: AgentId },

    /// Recovery state for a workflow, keyed by step id
    RecoveryInit { steps: HashMap<String, RecoveryStatus> },

    /// Stream upgrade accepted; subsequent frames are `StepEvent`s
    StreamReady,

    /// Error response
    Error { code: ErrorCode, message: String },
}

impl Response {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Response::Error { code, message: message.into() }
    }
}
