//! The session manager: tracks every live connection and its room binding.
//!
//! # Concurrency note
//!
//! `SessionManager` is not thread-safe by itself. It is owned by the gateway
//! task, which processes one command at a time, so a plain `HashMap` is
//! enough.

use std::collections::HashMap;
use std::time::Instant;

use wordrace_protocol::{PlayerId, RoomCode, ServerEnvelope, ServerPayload};

use crate::{Outbound, Session, SessionError};

/// Manages all live player sessions.
///
/// ```text
/// create() ──→ bind(code) ──→ unbind() / bind(other) ──→ remove()
///    │                                                      │
///    ▼                                                      ▼
/// [unbound]          [bound to exactly one room]         [gone]
/// ```
pub struct SessionManager {
    /// All live sessions, keyed by player ID.
    sessions: HashMap<PlayerId, Session>,

    /// Reference point for envelope timestamps.
    started: Instant,
}

impl SessionManager {
    /// Creates a new, empty session manager.
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            started: Instant::now(),
        }
    }

    /// Registers a new connection.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyConnected`] if the id is in use.
    pub fn create(
        &mut self,
        player_id: PlayerId,
        outbound: Outbound,
    ) -> Result<&Session, SessionError> {
        if self.sessions.contains_key(&player_id) {
            return Err(SessionError::AlreadyConnected(player_id));
        }
        tracing::debug!(%player_id, "session created");
        Ok(self
            .sessions
            .entry(player_id)
            .or_insert_with(|| Session::new(player_id, outbound)))
    }

    /// Forgets a connection and returns its last state, so the caller can
    /// see which room it was bound to.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session exists.
    pub fn remove(&mut self, player_id: PlayerId) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        tracing::debug!(%player_id, "session removed");
        Ok(session)
    }

    /// Binds a connection to a room, replacing any previous binding.
    ///
    /// Returns the room it was bound to before.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session exists.
    pub fn bind(
        &mut self,
        player_id: PlayerId,
        code: RoomCode,
    ) -> Result<Option<RoomCode>, SessionError> {
        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        Ok(session.room.replace(code))
    }

    /// Clears a connection's binding. Returns the room it was bound to.
    pub fn unbind(&mut self, player_id: PlayerId) -> Option<RoomCode> {
        self.sessions.get_mut(&player_id)?.room.take()
    }

    /// Clears every binding to `code`. Returns the players that were bound.
    pub fn unbind_all(&mut self, code: &RoomCode) -> Vec<PlayerId> {
        let mut unbound: Vec<PlayerId> = self
            .sessions
            .values_mut()
            .filter(|s| s.room.as_ref() == Some(code))
            .map(|s| {
                s.room = None;
                s.player_id
            })
            .collect();
        unbound.sort();
        unbound
    }

    /// The room a connection is bound to.
    pub fn room_of(&self, player_id: PlayerId) -> Option<&RoomCode> {
        self.sessions.get(&player_id)?.room.as_ref()
    }

    /// Queues a frame for one connection.
    ///
    /// Returns `false` if the player is unknown or its writer has gone away.
    /// Both are normal during disconnect races and are not errors.
    pub fn send(&mut self, player_id: PlayerId, payload: ServerPayload) -> bool {
        let timestamp = self.elapsed_ms();
        match self.sessions.get_mut(&player_id) {
            Some(session) => session.push(|seq| ServerEnvelope {
                seq,
                timestamp,
                payload,
            }),
            None => {
                tracing::trace!(%player_id, "send to unknown session dropped");
                false
            }
        }
    }

    /// Queues a frame for every connection bound to `code`.
    ///
    /// Returns the number of connections the frame was queued for.
    pub fn broadcast(&mut self, code: &RoomCode, payload: &ServerPayload) -> usize {
        let timestamp = self.elapsed_ms();
        let mut delivered = 0;
        for session in self.sessions.values_mut() {
            if session.room.as_ref() != Some(code) {
                continue;
            }
            let queued = session.push(|seq| ServerEnvelope {
                seq,
                timestamp,
                payload: payload.clone(),
            });
            if queued {
                delivered += 1;
            }
        }
        tracing::trace!(room_code = %code, delivered, "broadcast");
        delivered
    }

    /// Looks up a session by player ID.
    pub fn get(&self, player_id: PlayerId) -> Option<&Session> {
        self.sessions.get(&player_id)
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Milliseconds since the manager was created.
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
