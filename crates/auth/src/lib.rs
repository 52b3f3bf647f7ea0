// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! crank-auth: issuance and verification of agent bearer tokens.
//!
//! Tokens are compact HS256 JWTs binding a numeric agent identity to an
//! expiration instant. They are issued once per session window by the
//! bootstrap registration call and verified on every other call by the
//! authorization gate. Claims are never persisted server-side.

mod authority;

pub use authority::{AgentClaims, AuthError, TokenAuthority, TOKEN_TTL_DEFAULT};
