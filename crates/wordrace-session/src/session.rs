//! Session types: the server's record of one connection.

use tokio::sync::mpsc;
use wordrace_protocol::{PlayerId, RoomCode, ServerEnvelope};

/// Queue of frames waiting to be written to a connection.
///
/// Unbounded so fan-out from the gateway never waits on a slow socket. The
/// connection's writer task drains it.
pub type Outbound = mpsc::UnboundedSender<ServerEnvelope>;

/// A single player's session on the server.
///
/// Lives exactly as long as the connection. There is no reconnection: a
/// dropped connection is a departure.
#[derive(Debug)]
pub struct Session {
    /// Which player this session belongs to.
    pub player_id: PlayerId,

    /// The room this connection is bound to, if any.
    pub room: Option<RoomCode>,

    outbound: Outbound,

    /// Next sequence number for frames sent to this connection.
    seq: u64,
}

impl Session {
    pub(crate) fn new(player_id: PlayerId, outbound: Outbound) -> Self {
        Self {
            player_id,
            room: None,
            outbound,
            seq: 1,
        }
    }

    /// Queues a frame. Returns `false` if the connection's writer is gone.
    pub(crate) fn push(&mut self, build: impl FnOnce(u64) -> ServerEnvelope) -> bool {
        let seq = self.seq;
        self.seq += 1;
        self.outbound.send(build(seq)).is_ok()
    }

    /// Returns `true` while the writer task is still draining the queue.
    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }
}
