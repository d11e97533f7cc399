//! The room registry: code minting, lookup, and the expiry sweep.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tracing::info;
use wordrace_clock::Clock;
use wordrace_protocol::RoomCode;

use crate::{JoinCommand, Room, RoomConfig, RoomSettings};

/// Smallest and one-past-largest value of a minted code.
const CODE_RANGE: std::ops::Range<u32> = 100_000..1_000_000;

/// Owns every live room, keyed by its 6-digit code.
///
/// Not thread-safe by itself; the gateway task owns it.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    config: RoomConfig,
    clock: Arc<dyn Clock>,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
            clock,
        }
    }

    /// Creates a room under a fresh code with `host` as its only player.
    pub fn create(&mut self, host: JoinCommand, settings: RoomSettings) -> &mut Room {
        let code = self.mint_code();
        info!(room_code = %code, player_id = %host.player, "room created");
        let room = Room::new(
            code.clone(),
            host,
            settings,
            self.config.clone(),
            Arc::clone(&self.clock),
        );
        self.rooms.entry(code).or_insert(room)
    }

    /// Draws random codes until one is free.
    fn mint_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let Some(code) = RoomCode::from_number(rng.random_range(CODE_RANGE)) else {
                continue;
            };
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn get_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// Removes a room. Dropping it cancels any pending timer.
    pub fn delete(&mut self, code: &RoomCode) -> Option<Room> {
        let room = self.rooms.remove(code)?;
        info!(room_code = %code, "room deleted");
        Some(room)
    }

    /// Removes every room older than the configured TTL, whatever its state.
    ///
    /// Returns the removed codes, sorted.
    pub fn sweep_expired(&mut self) -> Vec<RoomCode> {
        let now = self.clock.now();
        let ttl = self.config.room_ttl.as_millis() as u64;
        let mut expired: Vec<RoomCode> = self
            .rooms
            .iter()
            .filter(|(_, room)| now.saturating_sub(room.created_at()) > ttl)
            .map(|(code, _)| code.clone())
            .collect();
        expired.sort();
        for code in &expired {
            self.rooms.remove(code);
        }
        if !expired.is_empty() {
            info!(count = expired.len(), remaining = self.rooms.len(), "expired rooms swept");
        }
        expired
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
