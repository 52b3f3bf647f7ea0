// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Authorization gate for inbound calls.
//!
//! Every call except the bootstrap registration must carry a valid bearer
//! token in its metadata. The gate verifies it and appends the resolved
//! `agent_id` to the same metadata, which is the context handed to the
//! handler — unary handlers read it from the envelope, the step event
//! stream keeps it for the life of the connection. One implementation
//! covers both call shapes; the gate never touches message framing.

use thiserror::Error;

use crank_auth::{AuthError, TokenAuthority};
use crank_wire::{Metadata, METHOD_REGISTER};

/// Rejection reasons, in the order they are checked.
///
/// The messages are part of the protocol: clients distinguish the three
/// cases when deciding whether to re-register.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("metadata not provided")]
    MetadataNotProvided,

    #[error("token not provided")]
    TokenNotProvided,

    #[error("access token is invalid")]
    InvalidToken(#[source] AuthError),
}

/// Validates call metadata before any handler runs.
#[derive(Clone)]
pub struct Gate {
    authority: TokenAuthority,
}

impl Gate {
    pub fn new(authority: TokenAuthority) -> Self {
        Self { authority }
    }

    /// Authorize one inbound call.
    ///
    /// The bootstrap method passes through untouched — the agent holds no
    /// token yet. For everything else the token is verified and the
    /// verified identity is injected into `meta`; any failure aborts the
    /// call with no handler execution and no retry.
    pub fn authorize(
        &self,
        method: &str,
        meta: &mut Option<Metadata>,
    ) -> Result<(), GateError> {
        if method == METHOD_REGISTER {
            return Ok(());
        }

        let meta = meta.as_mut().ok_or(GateError::MetadataNotProvided)?;
        let token = meta.token().ok_or(GateError::TokenNotProvided)?;
        let claims = self.authority.verify(token).map_err(GateError::InvalidToken)?;
        meta.set_agent_id(claims.agent_id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
