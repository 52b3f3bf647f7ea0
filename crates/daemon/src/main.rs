// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! crankd: the crank coordination daemon.
//!
//! Binds the Unix socket (plus optional TCP), wires the gate, registrar,
//! and recovery coordinator together, and runs the listener until a
//! shutdown signal arrives.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crank_auth::TokenAuthority;
use crank_core::SystemClock;
use crank_storage::{MemStore, SharedStore};

use crank_daemon::{
    env, lifecycle, Config, Gate, ListenCtx, Listener, LifecycleError, RecoveryCoordinator,
    Registrar,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), LifecycleError> {
    let secret = env::agent_secret()?;
    let config = Config::load()?;

    info!("crankd {} starting", env::PROTOCOL_VERSION);

    let result = lifecycle::startup(config).await?;

    let store: SharedStore = Arc::new(MemStore::new());
    let clock = SystemClock;
    let authority = TokenAuthority::new(&secret, env::token_ttl());

    let recovery_enabled = env::recovery_enabled();
    if !recovery_enabled {
        info!("step recovery disabled via CRANK_RECOVERY");
    }

    let ctx = Arc::new(ListenCtx {
        gate: Gate::new(authority.clone()),
        registrar: Registrar::new(secret, authority, Arc::clone(&store), clock.clone()),
        recovery: RecoveryCoordinator::new(store, clock, recovery_enabled),
        ipc_timeout: env::ipc_timeout(),
    });

    let listener = match result.tcp {
        Some(tcp) => Listener::with_tcp(result.unix, tcp, ctx),
        None => Listener::new(result.unix, ctx),
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tokio::select! {
        () = listener.run() => {}
        _ = &mut ctrl_c => info!("Received SIGINT, shutting down"),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
    }

    result.lifecycle.shutdown();
    Ok(())
}
