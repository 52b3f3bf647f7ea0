// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Step event stream handling.
//!
//! After the `StreamReady` handshake the connection stops being
//! request/response: the agent pushes framed [`StepEvent`]s as steps
//! progress and the daemon acks each one. A clean close from the agent
//! ends the stream.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crank_core::Clock;
use crank_wire::{decode, read_message, write_response, Metadata, ProtocolError, Response, StepEvent};

use super::{recovery_error_response, ConnectionError, ListenCtx};

/// Drive one upgraded step event stream until the agent disconnects.
///
/// Events are applied through the same coordinator path as unary updates,
/// one ack frame per event. There is no per-frame timeout: an agent may
/// sit idle between steps for as long as the workflow runs.
pub(super) async fn handle_step_event_stream<R, W, C>(
    workflow_id: &str,
    meta: &Metadata,
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx<C>,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Clock,
{
    info!(workflow_id, agent_id = ?meta.agent_id(), "step event stream opened");

    write_response(&mut writer, &Response::StreamReady, ctx.ipc_timeout).await?;

    loop {
        let bytes = match read_message(&mut reader).await {
            Ok(bytes) => bytes,
            Err(ProtocolError::ConnectionClosed) => break,
            Err(e) => return Err(e.into()),
        };
        let event: StepEvent = decode(&bytes)?;

        debug!(workflow_id, step_id = event.step_id, status = %event.status, "step event received");

        let response = match ctx
            .recovery
            .update_step_recovery_state(workflow_id, &event.step_id, event.status, event.exit_code)
            .await
        {
            Ok(()) => Response::Ok,
            Err(e) => recovery_error_response(e),
        };
        write_response(&mut writer, &response, ctx.ipc_timeout).await?;
    }

    info!(workflow_id, "step event stream closed");
    Ok(())
}
