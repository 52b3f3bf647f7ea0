// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve state directory: CRANK_STATE_DIR > XDG_STATE_HOME/crank > ~/.local/state/crank
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("CRANK_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("crank"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/crank"))
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    std::env::var("CRANK_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// TCP port for remote agents. When set, the daemon listens on this port
/// in addition to the Unix socket.
pub fn tcp_port() -> Option<u16> {
    std::env::var("CRANK_TCP_PORT").ok().and_then(|s| s.parse::<u16>().ok())
}

/// Long-lived shared agent secret, presented by agents in the bootstrap
/// registration call. Required for the daemon to start.
pub fn agent_secret() -> Result<String, LifecycleError> {
    std::env::var("CRANK_AGENT_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(LifecycleError::NoAgentSecret)
}

/// Bearer token validity window (default 1 hour).
pub fn token_ttl() -> Duration {
    std::env::var("CRANK_TOKEN_TTL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(3600))
}

/// Whether the step recovery subsystem is enabled (default on).
pub fn recovery_enabled() -> bool {
    match std::env::var("CRANK_RECOVERY") {
        Ok(v) => !matches!(v.as_str(), "0" | "false" | "off"),
        Err(_) => true,
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
