//! Per-connection handler: frame decoding and the outbound writer.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register with the gateway, handing it the outbound channel
//!   2. Spawn a writer that drains the channel onto the socket
//!   3. Loop: receive frames → decode → forward to the gateway
//!   4. On close, error, or idle timeout: the guard reports the disconnect

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use wordrace_protocol::{ClientEnvelope, Codec, PlayerId, ServerEnvelope};
use wordrace_transport::{Connection, WebSocketConnection};

use crate::WordraceError;
use crate::gateway::{Command, CommandSender};

/// Drop guard that tells the gateway a player is gone when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler panics. The command
/// channel is unbounded, so the send never has to wait.
struct SessionGuard {
    player: PlayerId,
    commands: CommandSender,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Disconnected {
            player: self.player,
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    commands: CommandSender,
    codec: C,
    idle_timeout: Duration,
) -> Result<(), WordraceError>
where
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let player = PlayerId(conn.id().into_inner());
    tracing::debug!(%player, peer = %conn.peer_addr(), "handling new connection");

    let (outbound, mut frames) = mpsc::unbounded_channel::<ServerEnvelope>();
    commands
        .send(Command::Connected { player, outbound })
        .map_err(|_| WordraceError::GatewayClosed)?;
    let _guard = SessionGuard {
        player,
        commands: commands.clone(),
    };

    // --- Writer: gateway → socket ---
    let writer = {
        let conn = Arc::clone(&conn);
        let codec = codec.clone();
        tokio::spawn(async move {
            while let Some(envelope) = frames.recv().await {
                let bytes = match codec.encode(&envelope) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(%player, error = %e, "failed to encode frame");
                        continue;
                    }
                };
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(%player, error = %e, "send failed");
                    break;
                }
            }
        })
    };

    // --- Reader: socket → gateway ---
    loop {
        let data = match tokio::time::timeout(idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player, "connection idle, closing");
                break;
            }
        };

        let command = match codec.decode::<ClientEnvelope>(&data) {
            Ok(envelope) => Command::Request {
                player,
                request_id: envelope.request_id,
                message: envelope.message,
            },
            Err(e) => {
                tracing::debug!(%player, error = %e, "failed to decode envelope");
                Command::Malformed { player }
            }
        };
        if commands.send(command).is_err() {
            return Err(WordraceError::GatewayClosed);
        }
    }

    writer.abort();
    if let Err(e) = conn.close().await {
        tracing::trace!(%player, error = %e, "close after disconnect");
    }

    // _guard drops here → Disconnected reaches the gateway.
    Ok(())
}
