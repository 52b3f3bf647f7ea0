// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! crank daemon library: the agent-coordination core.
//!
//! Three pieces, wired together by the listener:
//! - [`gate`] — per-call token authorization, shared by unary and
//!   streaming dispatch
//! - [`register`] — the bootstrap authentication call that trades the
//!   shared agent secret for a bearer token
//! - [`recovery`] — the per-step crash-recovery coordinator

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod gate;
pub mod lifecycle;
pub mod listener;
pub mod recovery;
pub mod register;

pub use gate::{Gate, GateError};
pub use lifecycle::{startup, Config, Lifecycle, LifecycleError, StartupResult};
pub use listener::{ListenCtx, Listener};
pub use recovery::{RecoveryCoordinator, RecoveryError};
pub use register::{RegisterError, Registrar};
