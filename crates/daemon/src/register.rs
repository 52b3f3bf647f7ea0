// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Bootstrap authentication.
//!
//! The one unauthenticated call: an agent presents the long-lived shared
//! secret plus an identity hint and receives a fresh bearer token. A hint
//! of `-1` registers a new agent; any other hint must name an agent the
//! storage layer already knows.

use thiserror::Error;

use crank_auth::{AuthError, TokenAuthority};
use crank_core::{AgentId, Clock, UNREGISTERED_AGENT};
use crank_storage::{SharedStore, StorageError};

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("invalid agent secret")]
    InvalidSecret,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl RegisterError {
    /// Whether the failure should be signaled as `unauthenticated`
    /// (bad secret, unknown identity) rather than an internal error.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidSecret | Self::Storage(StorageError::AgentNotFound(_))
        )
    }
}

/// Handles the bootstrap registration call.
pub struct Registrar<C: Clock> {
    secret: String,
    authority: TokenAuthority,
    store: SharedStore,
    clock: C,
}

impl<C: Clock> Registrar<C> {
    pub fn new(secret: String, authority: TokenAuthority, store: SharedStore, clock: C) -> Self {
        Self { secret, authority, store, clock }
    }

    /// Validate the shared secret, resolve or assign the agent identity,
    /// and issue a token for it.
    pub async fn register(
        &self,
        secret: &str,
        hint: AgentId,
    ) -> Result<(String, AgentId), RegisterError> {
        if secret != self.secret {
            return Err(RegisterError::InvalidSecret);
        }

        let agent = if hint == UNREGISTERED_AGENT {
            self.store.agent_create(self.clock.epoch_secs()).await?
        } else {
            self.store.agent_find(hint).await?
        };

        let token = self.authority.issue(agent.id)?;
        Ok((token, agent.id))
    }
}

#[cfg(test)]
#[path = "register_tests.rs"]
mod tests;
