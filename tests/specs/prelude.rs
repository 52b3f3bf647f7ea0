// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Shared spec harness: an in-process daemon bound to a real Unix socket.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::UnixStream;
use tokio::task::JoinHandle;

use crank_auth::TokenAuthority;
use crank_core::SystemClock;
use crank_daemon::{Gate, ListenCtx, Listener, RecoveryCoordinator, Registrar};
use crank_storage::{MemStore, SharedStore};
use crank_wire::{read_frame, write_frame, Envelope, Metadata, Request, Response};

pub const TIMEOUT: Duration = Duration::from_secs(2);
pub const SECRET: &str = "integration-agent-secret";

/// A daemon running inside the test process.
///
/// The storage handle is exposed so a restart can be simulated by
/// stopping one daemon and starting another over the same store.
pub struct TestDaemon {
    pub socket_path: PathBuf,
    pub store: SharedStore,
    _state_dir: TempDir,
    task: JoinHandle<()>,
}

impl TestDaemon {
    pub async fn start() -> Self {
        Self::start_with(Arc::new(MemStore::new()), true).await
    }

    pub async fn start_with(store: SharedStore, recovery_enabled: bool) -> Self {
        let state_dir = TempDir::new().unwrap();
        let socket_path = state_dir.path().join("daemon.sock");
        let unix = tokio::net::UnixListener::bind(&socket_path).unwrap();

        let clock = SystemClock;
        let authority = TokenAuthority::new(SECRET, Duration::from_secs(3600));
        let ctx = Arc::new(ListenCtx {
            gate: Gate::new(authority.clone()),
            registrar: Registrar::new(
                SECRET.to_string(),
                authority,
                Arc::clone(&store),
                clock.clone(),
            ),
            recovery: RecoveryCoordinator::new(Arc::clone(&store), clock, recovery_enabled),
            ipc_timeout: TIMEOUT,
        });

        let task = tokio::spawn(Listener::new(unix, ctx).run());
        Self { socket_path, store, _state_dir: state_dir, task }
    }

    pub async fn connect(&self) -> UnixStream {
        UnixStream::connect(&self.socket_path).await.unwrap()
    }

    /// One unary call on a fresh connection.
    pub async fn call(&self, envelope: &Envelope) -> Response {
        let mut stream = self.connect().await;
        write_frame(&mut stream, envelope, TIMEOUT).await.unwrap();
        read_frame(&mut stream, TIMEOUT).await.unwrap()
    }

    /// Register a new agent and return metadata carrying its token.
    pub async fn register(&self) -> (Metadata, i64) {
        let request = Request::Register { secret: SECRET.to_string(), agent_id: -1 };
        match self.call(&Envelope::new(request)).await {
            Response::Registered { token, agent_id } => {
                (Metadata::new().with_token(token), agent_id)
            }
            other => panic!("expected Registered, got {:?}", other),
        }
    }

    /// Simulate a crash: stop serving without any cleanup.
    pub fn kill(self) -> SharedStore {
        self.task.abort();
        Arc::clone(&self.store)
    }
}
