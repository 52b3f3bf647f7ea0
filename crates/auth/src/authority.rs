// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Token authority: stateless HS256 issue/verify.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crank_core::AgentId;

/// Default token validity window.
pub const TOKEN_TTL_DEFAULT: Duration = Duration::from_secs(3600);

/// Claims embedded in an agent bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentClaims {
    pub agent_id: AgentId,
    /// Expiration, epoch seconds.
    pub exp: u64,
}

/// Token verification and issuance failures.
///
/// Any failure is terminal for the call; there is no partial validation.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("access token is invalid")]
    Invalid,

    #[error("access token has expired")]
    Expired,

    #[error("failed to sign token")]
    Sign(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies signed, time-limited agent tokens.
///
/// The signing secret is injected at construction and shared read-only
/// across all calls; the authority keeps no per-token state.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Issue a token binding `agent_id` to an expiry `ttl` from now.
    pub fn issue(&self, agent_id: AgentId) -> Result<String, AuthError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        let claims = AgentClaims { agent_id, exp: (now + self.ttl).as_secs() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Sign)
    }

    /// Verify a token and return its claims.
    ///
    /// `Expired` when the current time is past `exp`; `Invalid` for any
    /// other decode or signature failure.
    pub fn verify(&self, token: &str) -> Result<AgentClaims, AuthError> {
        match decode::<AgentClaims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(AuthError::Expired),
                _ => Err(AuthError::Invalid),
            },
        }
    }
}

#[cfg(test)]
#[path = "authority_tests.rs"]
mod tests;
