// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! RPC protocol between agents and the crank daemon.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod meta;
mod request;
mod response;
mod wire;

pub use meta::{Metadata, META_AGENT_ID, META_TOKEN};
pub use request::{Envelope, Request, StepEvent, METHOD_REGISTER};
pub use response::{ErrorCode, Response};
pub use wire::{decode, encode, read_message, write_message, ProtocolError, MAX_FRAME_LEN};
pub use wire::{read_envelope, read_frame, write_frame, write_response};
