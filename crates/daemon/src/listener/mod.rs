// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Listener task for handling agent connections.
//!
//! Accepts connections on a Unix socket (and optionally TCP for remote
//! agents), reads one call envelope per connection, runs it through the
//! authorization gate, and dispatches to the matching handler without
//! blocking other connections. `StepEventStream` upgrades the connection
//! instead of following the request/response shape.

mod stream;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, UnixListener};
use tracing::{debug, error, info, warn};

use crank_core::Clock;
use crank_wire::{
    read_envelope, write_response, ErrorCode, Metadata, ProtocolError, Request, Response,
};

use crate::gate::Gate;
use crate::recovery::{RecoveryCoordinator, RecoveryError};
use crate::register::Registrar;

/// Shared daemon context for all request handlers.
pub struct ListenCtx<C: Clock> {
    pub gate: Gate,
    pub registrar: Registrar<C>,
    pub recovery: RecoveryCoordinator<C>,
    pub ipc_timeout: Duration,
}

/// Listener task for accepting agent connections.
pub struct Listener<C: Clock> {
    unix: UnixListener,
    tcp: Option<TcpListener>,
    ctx: Arc<ListenCtx<C>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl<C: Clock + 'static> Listener<C> {
    /// Create a new listener with Unix socket only.
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx<C>>) -> Self {
        Self { unix, tcp: None, ctx }
    }

    /// Create a new listener with both Unix socket and TCP.
    pub fn with_tcp(unix: UnixListener, tcp: TcpListener, ctx: Arc<ListenCtx<C>>) -> Self {
        Self { unix, tcp: Some(tcp), ctx }
    }

    /// Run the listener loop, spawning a task per connection.
    pub async fn run(mut self) {
        match self.tcp.take() {
            Some(tcp) => self.run_dual(tcp).await,
            None => self.run_unix_only().await,
        }
    }

    async fn run_unix_only(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_connection(reader, writer, &ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("Unix accept error: {}", e),
            }
        }
    }

    async fn run_dual(self, tcp: TcpListener) {
        loop {
            tokio::select! {
                result = self.unix.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let ctx = Arc::clone(&self.ctx);
                            tokio::spawn(async move {
                                let (reader, writer) = stream.into_split();
                                if let Err(e) = handle_connection(reader, writer, &ctx).await {
                                    log_connection_error(e);
                                }
                            });
                        }
                        Err(e) => error!("Unix accept error: {}", e),
                    }
                }
                result = tcp.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            debug!("TCP connection from {}", addr);
                            let ctx = Arc::clone(&self.ctx);
                            tokio::spawn(async move {
                                let (reader, writer) = stream.into_split();
                                if let Err(e) = handle_connection(reader, writer, &ctx).await {
                                    log_connection_error(e);
                                }
                            });
                        }
                        Err(e) => error!("TCP accept error: {}", e),
                    }
                }
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
            debug!("Agent disconnected")
        }
        ConnectionError::Protocol(ProtocolError::Timeout) => {
            warn!("Connection timeout")
        }
        _ => error!("Connection error: {}", e),
    }
}

/// Handle a single agent connection.
///
/// Reads the envelope, runs the authorization gate, then either upgrades
/// the connection (`StepEventStream`) or races the unary handler against
/// client disconnect so a dropped connection cancels pending work.
///
/// Generic over reader/writer types so it works with both Unix and TCP
/// streams (and in-memory duplex pipes in tests).
pub async fn handle_connection<R, W, C>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx<C>,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + AsyncReadExt + Unpin + Send + 'static,
    W: AsyncWrite + AsyncWriteExt + Unpin + Send + 'static,
    C: Clock,
{
    let mut envelope = read_envelope(&mut reader, ctx.ipc_timeout).await?;

    // Every call but the bootstrap one must pass the gate. The gate
    // appends the verified agent_id to the metadata; handlers read the
    // identity from there and never from the request body.
    if let Err(e) = ctx.gate.authorize(envelope.request.method(), &mut envelope.meta) {
        debug!(method = envelope.request.method(), error = %e, "call rejected");
        let response = Response::error(ErrorCode::Unauthenticated, e.to_string());
        write_response(&mut writer, &response, ctx.ipc_timeout).await?;
        return Ok(());
    }

    let meta = envelope.meta.unwrap_or_default();

    if matches!(envelope.request, Request::Register { .. }) {
        debug!("received registration request");
    } else {
        debug!(request = ?envelope.request, "received request");
    }

    // StepEventStream is a connection-upgrading request — after the
    // handshake the connection carries framed step events. Handle it
    // before the normal request/response dispatch.
    if let Request::StepEventStream { ref workflow_id } = envelope.request {
        return stream::handle_step_event_stream(workflow_id, &meta, reader, writer, ctx).await;
    }

    // Race handler against client disconnect; a dropped connection drops
    // the handler future with it.
    let response = tokio::select! {
        response = handle_request(envelope.request, &meta, ctx) => response,
        _ = detect_client_disconnect(&mut reader) => {
            debug!("Agent disconnected, cancelling handler");
            return Ok(());
        }
    };

    debug!("Sending response: {:?}", response);

    write_response(&mut writer, &response, ctx.ipc_timeout).await?;

    Ok(())
}

/// Detect client disconnect by reading from the socket after the request.
///
/// The client sends one request then waits; a read of 0 bytes (EOF) means
/// it went away.
async fn detect_client_disconnect<R: AsyncReadExt + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

/// Handle a single request and return a response.
async fn handle_request<C: Clock>(
    request: Request,
    meta: &Metadata,
    ctx: &ListenCtx<C>,
) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Register { secret, agent_id } => {
            match ctx.registrar.register(&secret, agent_id).await {
                Ok((token, agent_id)) => {
                    info!(agent_id, "agent registered");
                    Response::Registered { token, agent_id }
                }
                Err(e) if e.is_unauthenticated() => {
                    warn!(error = %e, "registration rejected");
                    Response::error(ErrorCode::Unauthenticated, e.to_string())
                }
                Err(e) => Response::error(ErrorCode::Internal, e.to_string()),
            }
        }

        Request::InitWorkflowRecovery { workflow_id, step_ids, ttl_secs } => {
            match ctx
                .recovery
                .init_workflow_recovery(meta, &workflow_id, &step_ids, ttl_secs)
                .await
            {
                Ok(steps) => {
                    info!(workflow_id, steps = steps.len(), "workflow recovery initialized");
                    Response::RecoveryInit { steps }
                }
                Err(e) => recovery_error_response(e),
            }
        }

        Request::UpdateStepRecoveryState { workflow_id, step_id, status, exit_code } => {
            match ctx
                .recovery
                .update_step_recovery_state(&workflow_id, &step_id, status, exit_code)
                .await
            {
                Ok(()) => {
                    debug!(workflow_id, step_id, %status, "step recovery state updated");
                    Response::Ok
                }
                Err(e) => recovery_error_response(e),
            }
        }

        // Intercepted in handle_connection before reaching handle_request
        Request::StepEventStream { .. } => unreachable!(),
    }
}

/// Map coordinator failures to wire responses.
///
/// Storage failures keep their own message so callers can tell causes
/// apart; only the category is normalized.
fn recovery_error_response(e: RecoveryError) -> Response {
    match e {
        RecoveryError::Disabled => Response::error(ErrorCode::RecoveryDisabled, e.to_string()),
        RecoveryError::IdentityMissing => {
            Response::error(ErrorCode::Unauthenticated, e.to_string())
        }
        RecoveryError::Storage(_) | RecoveryError::UnknownStatus(_) => {
            Response::error(ErrorCode::Internal, e.to_string())
        }
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
