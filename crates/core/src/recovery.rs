// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Per-step recovery records and their state machine.
//!
//! One record exists per `(workflow_id, step_id)` pair, created in bulk at
//! workflow start and updated independently as the owning agent reports
//! progress. Records survive agent and server crashes so a restarted run
//! can discover which steps are already done and skip re-execution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::AgentId;

/// Default TTL hint for recovery records, in seconds (24 hours).
///
/// The storage layer uses the TTL to garbage-collect stale records once
/// the workflow has finished; the coordinator itself never deletes.
pub const RECOVERY_TTL_DEFAULT: u64 = 86_400;

/// Execution status of one recoverable step.
///
/// Stored on disk as the ordinal code (see [`RecoveryStatus::code`]) and
/// translated back at the coordinator boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStatus {
    /// Assigned at workflow start, before any agent has begun the step.
    Pending,
    /// An agent has claimed and started the step.
    Running,
    /// Step finished without error.
    Success,
    /// Step finished with a non-zero outcome.
    Failed,
    /// Step never ran; upstream conditions excluded it.
    Skipped,
}

crate::simple_display! {
    RecoveryStatus {
        Pending => "pending",
        Running => "running",
        Success => "success",
        Failed => "failed",
        Skipped => "skipped",
    }
}

/// A status code read back from storage that maps to no known status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown recovery status code {0}")]
pub struct UnknownStatusCode(pub u8);

impl RecoveryStatus {
    /// Ordinal code used by the storage layer.
    pub fn code(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Success => 2,
            Self::Failed => 3,
            Self::Skipped => 4,
        }
    }

    /// Translate an on-disk ordinal code back to a status.
    pub fn from_code(code: u8) -> Result<Self, UnknownStatusCode> {
        match code {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Running),
            2 => Ok(Self::Success),
            3 => Ok(Self::Failed),
            4 => Ok(Self::Skipped),
            other => Err(UnknownStatusCode(other)),
        }
    }

    /// `Success`, `Failed`, and `Skipped` accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Skipped)
    }

    /// Forward-only transition table.
    ///
    /// `Pending -> Running | Skipped`, `Running -> Success | Failed`.
    pub fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Skipped)
                | (Self::Running, Self::Success)
                | (Self::Running, Self::Failed)
        )
    }
}

/// Durable state tracking one step's execution for crash resumption.
///
/// `agent_id` reflects the agent that last claimed the step, not
/// necessarily the one that finishes it — steps may be reassigned after a
/// crash. Timestamps are epoch seconds, zero when not yet reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub workflow_id: String,
    pub step_id: String,
    pub agent_id: AgentId,
    /// On-disk ordinal of [`RecoveryStatus`].
    pub status: u8,
    /// Meaningful only for terminal statuses; set on `Failed`.
    pub exit_code: i64,
    pub started_at: u64,
    pub finished_at: u64,
    /// TTL hint in seconds, supplied at creation.
    pub expiry: u64,
}

impl RecoveryRecord {
    /// A fresh `Pending` record with zeroed timestamps.
    pub fn new(workflow_id: impl Into<String>, step_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            step_id: step_id.into(),
            agent_id: 0,
            status: RecoveryStatus::Pending.code(),
            exit_code: 0,
            started_at: 0,
            finished_at: 0,
            expiry: RECOVERY_TTL_DEFAULT,
        }
    }

    crate::setters! {
        set {
            agent_id: AgentId,
            exit_code: i64,
            started_at: u64,
            finished_at: u64,
            expiry: u64,
        }
    }

    pub fn with_status(mut self, status: RecoveryStatus) -> Self {
        self.status = status.code();
        self
    }

    /// Decode the stored status code.
    pub fn status(&self) -> Result<RecoveryStatus, UnknownStatusCode> {
        RecoveryStatus::from_code(self.status)
    }

    /// Whether the record's TTL has elapsed relative to its last activity.
    ///
    /// Records with no activity yet measure from zero and are never expired
    /// until they carry a timestamp. `expiry` comes straight off the wire,
    /// so the deadline saturates rather than wrapping on huge TTLs.
    pub fn is_expired(&self, now_secs: u64) -> bool {
        let last = self.finished_at.max(self.started_at);
        last > 0 && now_secs >= last.saturating_add(self.expiry)
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
