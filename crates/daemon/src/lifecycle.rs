// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Daemon lifecycle management: startup and shutdown.

use std::path::PathBuf;

use thiserror::Error;
use tokio::net::{TcpListener, UnixListener};
use tracing::{info, warn};

use crate::env;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/crank)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
}

impl Config {
    /// Load configuration for the user-level daemon.
    ///
    /// Uses fixed paths under `$CRANK_STATE_DIR` (or `$XDG_STATE_HOME/crank/`,
    /// or `~/.local/state/crank/`). One daemon serves all agents for a user.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        Ok(Self { socket_path: state_dir.join("daemon.sock"), state_dir })
    }
}

/// Daemon state during operation.
///
/// The listeners are returned separately from startup to be handed to the
/// Listener task.
pub struct Lifecycle {
    /// Configuration
    pub config: Config,
}

/// Result of daemon startup.
pub struct StartupResult {
    /// The daemon lifecycle handle
    pub lifecycle: Lifecycle,
    /// The Unix socket listener to hand to the Listener task
    pub unix: UnixListener,
    /// Optional TCP listener for remote agents
    pub tcp: Option<TcpListener>,
}

/// Start the daemon: prepare the state directory and bind listeners.
pub async fn startup(config: Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // A socket file left behind by an unclean shutdown blocks the bind.
    // Nothing else lives at this path, so removal is safe.
    if config.socket_path.exists() {
        warn!("Removing stale socket file: {}", config.socket_path.display());
        std::fs::remove_file(&config.socket_path)?;
    }

    let unix = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;
    info!("Listening on {}", config.socket_path.display());

    let tcp = match env::tcp_port() {
        Some(port) => {
            let listener = TcpListener::bind(("0.0.0.0", port)).await?;
            info!("Listening on TCP port {}", port);
            Some(listener)
        }
        None => None,
    };

    Ok(StartupResult { lifecycle: Lifecycle { config }, unix, tcp })
}

impl Lifecycle {
    /// Clean shutdown: remove the socket file.
    ///
    /// The listener task stops when the tokio runtime exits.
    pub fn shutdown(&self) {
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }
        info!("Daemon shut down");
    }
}

/// Errors during daemon lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not resolve state directory (HOME not set)")]
    NoStateDir,

    #[error("CRANK_AGENT_SECRET is not set")]
    NoAgentSecret,

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, #[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
