// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! crank-storage: the storage collaborator behind the coordination core.
//!
//! The daemon talks to storage only through the [`Store`] trait; the SQL or
//! KV backend a deployment actually uses lives behind it. [`MemStore`] is
//! the in-process reference implementation.

mod mem;
mod store;

pub use mem::MemStore;
pub use store::{SharedStore, StorageError, Store};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fail;
#[cfg(any(test, feature = "test-support"))]
pub use fail::{FailOp, FailStore};
