// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! crank-core: shared types for the crank coordination daemon

pub mod macros;

pub mod agent;
pub mod clock;
pub mod recovery;

pub use agent::{Agent, AgentId, UNREGISTERED_AGENT};
pub use clock::{Clock, FakeClock, SystemClock};
pub use recovery::{RecoveryRecord, RecoveryStatus, UnknownStatusCode, RECOVERY_TTL_DEFAULT};
