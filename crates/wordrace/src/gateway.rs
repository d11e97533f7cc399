//! The gateway: one task that owns every room and session and applies
//! commands to them in arrival order.
//!
//! Connection handlers, room timers, the sweep ticker, and the HTTP surface
//! never touch room state. They send a [`Command`] down one channel and the
//! gateway handles it to completion before looking at the next one, so two
//! winning guesses that arrive "together" are still strictly ordered.
//!
//! ```text
//! handler ─┐
//! timer ───┤  mpsc<Command>   ┌──────────┐   ServerEnvelope
//! sweep ───┼────────────────→ │ Gateway  │ ──────────────→ per-connection writer
//! http ────┘                  └──────────┘
//! ```

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use wordrace_protocol::{
    Ack, AckData, ClientMessage, ErrorCode, Loose, PlayerId, RoomCode, RoomEvent, RoomPreview,
    ServerPayload,
};
use wordrace_room::{
    GameEnd, JoinCommand, LeaveOutcome, Player, ProgressOutcome, ProgressUpdate, Room, RoomError,
    RoomRegistry, RoomSettings, SettingsRequest,
};
use wordrace_session::{Outbound, SessionManager};
use wordrace_words::WordCatalog;

/// Longest display name kept, in characters.
const MAX_NAME_CHARS: usize = 20;

/// Name used when a client sends none.
const DEFAULT_NAME: &str = "Player";

/// Sending half of the gateway's command channel.
pub type CommandSender = mpsc::UnboundedSender<Command>;

/// Everything the gateway can be asked to do.
#[derive(Debug)]
pub enum Command {
    /// A connection finished its handshake.
    Connected { player: PlayerId, outbound: Outbound },
    /// A decoded client request.
    Request {
        player: PlayerId,
        request_id: Option<u64>,
        message: ClientMessage,
    },
    /// A frame that didn't decode.
    Malformed { player: PlayerId },
    /// A connection went away. Same as leaving, then forgetting the session.
    Disconnected { player: PlayerId },
    /// A room's time limit ran out for the given round.
    TimeUp { code: RoomCode, round: u64 },
    /// Remove rooms past their TTL.
    Sweep,
    /// Counters for the health probe.
    Stats { reply: oneshot::Sender<GatewayStats> },
    /// Public summary of one room.
    Preview {
        code: RoomCode,
        reply: oneshot::Sender<Option<RoomPreview>>,
    },
}

/// Counters reported by the health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayStats {
    pub rooms: usize,
    pub connections: usize,
}

/// A request that succeeded: the caller's ack payload and what the room
/// should hear about it.
struct Applied {
    code: RoomCode,
    data: Option<AckData>,
    events: Vec<RoomEvent>,
}

pub struct Gateway {
    registry: RoomRegistry,
    sessions: SessionManager,
    words: WordCatalog,
    /// Handed to room timers so their expiry comes back as a command.
    commands: CommandSender,
}

impl Gateway {
    pub fn new(registry: RoomRegistry, words: WordCatalog, commands: CommandSender) -> Self {
        Self {
            registry,
            sessions: SessionManager::new(),
            words,
            commands,
        }
    }

    /// Handles commands until every sender is gone.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        info!("gateway running");
        while let Some(command) = commands.recv().await {
            self.handle(command);
        }
        info!("gateway stopped");
    }

    /// Applies one command to completion.
    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Connected { player, outbound } => {
                if let Err(e) = self.sessions.create(player, outbound) {
                    debug!(%player, error = %e, "duplicate connection ignored");
                }
            }
            Command::Request {
                player,
                request_id,
                message,
            } => self.request(player, request_id, message),
            Command::Malformed { player } => {
                self.sessions.send(
                    player,
                    ServerPayload::Ack(Ack::failed(None, ErrorCode::InvalidMessage)),
                );
            }
            Command::Disconnected { player } => {
                self.leave(player);
                if self.sessions.remove(player).is_ok() {
                    info!(%player, connections = self.sessions.len(), "player disconnected");
                }
            }
            Command::TimeUp { code, round } => self.time_up(&code, round),
            Command::Sweep => self.sweep(),
            Command::Stats { reply } => {
                let _ = reply.send(GatewayStats {
                    rooms: self.registry.len(),
                    connections: self.sessions.len(),
                });
            }
            Command::Preview { code, reply } => {
                let _ = reply.send(self.registry.get(&code).map(Room::preview));
            }
        }
    }

    // -- Requests ---------------------------------------------------------

    fn request(&mut self, player: PlayerId, request_id: Option<u64>, message: ClientMessage) {
        debug!(%player, kind = message.kind(), "request");
        let result = match message {
            ClientMessage::CreateRoom {
                player_name,
                difficulty,
                game_mode,
                time_limit,
                word_length,
            } => {
                let request = settings_request(word_length, difficulty, game_mode, time_limit);
                Ok(self.create_room(player, &player_name, &request))
            }
            ClientMessage::JoinRoom {
                room_code,
                player_name,
            } => self.join_room(player, &room_code, &player_name),
            ClientMessage::SetReady { ready } => self.set_ready(player, ready),
            ClientMessage::UpdateRoomSettings {
                difficulty,
                game_mode,
                time_limit,
                word_length,
            } => {
                let request = settings_request(word_length, difficulty, game_mode, time_limit);
                self.update_settings(player, &request)
            }
            ClientMessage::StartGame => self.start_game(player),
            ClientMessage::PlayAgain => self.play_again(player),
            ClientMessage::UpdateProgress {
                progress,
                won,
                correct_count,
            } => {
                self.update_progress(
                    player,
                    ProgressUpdate {
                        progress: progress.as_count().unwrap_or(0),
                        won,
                        correct_count: correct_count.and_then(|c| c.as_count()),
                    },
                );
                return;
            }
            ClientMessage::LeaveRoom => {
                self.leave(player);
                return;
            }
        };

        match result {
            Ok(applied) => {
                self.sessions
                    .send(player, ServerPayload::Ack(Ack::ok(request_id, applied.data)));
                for event in applied.events {
                    self.sessions
                        .broadcast(&applied.code, &ServerPayload::Event(event));
                }
            }
            Err(e) => {
                debug!(%player, error = %e, "request rejected");
                self.sessions
                    .send(player, ServerPayload::Ack(Ack::failed(request_id, e.code())));
            }
        }
    }

    fn create_room(&mut self, player: PlayerId, name: &str, request: &SettingsRequest) -> Applied {
        self.leave(player);

        let settings = RoomSettings::resolve(request, None);
        let room = self.registry.create(
            JoinCommand {
                player,
                name: display_name(name),
            },
            settings,
        );
        let code = room.code().clone();
        let snapshot = room.snapshot();
        self.bind(player, &code);

        Applied {
            code: code.clone(),
            data: Some(AckData::RoomCreated {
                room_code: code,
                room: snapshot,
            }),
            events: Vec::new(),
        }
    }

    fn join_room(
        &mut self,
        player: PlayerId,
        raw_code: &Loose,
        name: &str,
    ) -> Result<Applied, RoomError> {
        let code = raw_code
            .to_text()
            .and_then(|text| RoomCode::parse(&text))
            .ok_or(RoomError::NoRoom)?;

        // Already here: report the room as it is.
        if self.sessions.room_of(player) == Some(&code) {
            if let Some(room) = self.registry.get(&code).filter(|r| r.contains(player)) {
                return Ok(Applied {
                    code,
                    data: Some(AckData::RoomJoined {
                        room: room.snapshot(),
                    }),
                    events: Vec::new(),
                });
            }
        }

        // Refuse before touching the current room.
        self.registry
            .get(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?
            .check_join(player)?;
        self.leave(player);

        let room = self
            .registry
            .get_mut(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let joined = room
            .add_player(JoinCommand {
                player,
                name: display_name(name),
            })?
            .snapshot();
        let snapshot = room.snapshot();
        self.bind(player, &code);

        Ok(Applied {
            code,
            data: Some(AckData::RoomJoined {
                room: snapshot.clone(),
            }),
            events: vec![RoomEvent::PlayerJoined {
                player: joined,
                room: snapshot,
            }],
        })
    }

    fn set_ready(&mut self, player: PlayerId, ready: bool) -> Result<Applied, RoomError> {
        let code = self.bound_room(player)?;
        let room = self.room_mut(&code)?;
        room.set_ready(player, ready)?;
        Ok(Applied {
            events: vec![RoomEvent::RoomUpdated {
                room: room.snapshot(),
            }],
            code,
            data: None,
        })
    }

    fn update_settings(
        &mut self,
        player: PlayerId,
        request: &SettingsRequest,
    ) -> Result<Applied, RoomError> {
        let code = self.bound_room(player)?;
        let room = self.room_mut(&code)?;
        room.update_settings(player, request)?;
        let snapshot = room.snapshot();
        Ok(Applied {
            code,
            data: Some(AckData::SettingsUpdated {
                room: snapshot.clone(),
            }),
            events: vec![RoomEvent::RoomSettingsUpdated { room: snapshot }],
        })
    }

    fn start_game(&mut self, player: PlayerId) -> Result<Applied, RoomError> {
        let code = self.bound_room(player)?;
        let room = self
            .registry
            .get_mut(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        let commands = self.commands.clone();
        let timer_code = code.clone();
        let start = room.start_game(player, &mut self.words, move |round| {
            let _ = commands.send(Command::TimeUp {
                code: timer_code,
                round,
            });
        })?;

        Ok(Applied {
            data: Some(AckData::GameStarted {
                word_index: start.word_index,
                word_indices: start.word_indices.clone(),
            }),
            events: vec![RoomEvent::GameStarted {
                word_index: start.word_index,
                word_indices: start.word_indices,
                room: room.snapshot(),
            }],
            code,
        })
    }

    fn play_again(&mut self, player: PlayerId) -> Result<Applied, RoomError> {
        let code = self.bound_room(player)?;
        let room = self.room_mut(&code)?;
        room.play_again(player)?;
        Ok(Applied {
            events: vec![RoomEvent::RoomReset {
                room: room.snapshot(),
            }],
            code,
            data: None,
        })
    }

    /// Fire-and-forget: no ack, and nothing at all if the report was ignored.
    fn update_progress(&mut self, player: PlayerId, update: ProgressUpdate) {
        let Some(code) = self.sessions.room_of(player).cloned() else {
            return;
        };
        let Some(room) = self.registry.get_mut(&code) else {
            return;
        };

        let outcome = room.update_progress(player, update);
        let (echo, new_word_index, end) = match outcome {
            ProgressOutcome::Ignored => return,
            ProgressOutcome::Continuing { echo } => (echo, None, None),
            ProgressOutcome::NextWord { echo, word_pointer } => (echo, Some(word_pointer), None),
            ProgressOutcome::Finished { echo, end } => (echo, None, Some(end)),
        };

        let mut events = vec![RoomEvent::ProgressUpdated {
            player_id: player,
            progress: echo.progress,
            won: echo.won,
            correct_count: echo.correct_count,
            next_word: new_word_index.is_some(),
            new_word_index,
            room: room.snapshot(),
        }];
        if let Some(end) = end {
            events.push(finished_event(room, end));
        }
        for event in events {
            self.sessions.broadcast(&code, &ServerPayload::Event(event));
        }
    }

    // -- Lifecycle --------------------------------------------------------

    /// Takes a connection out of its room, if it's in one.
    fn leave(&mut self, player: PlayerId) {
        let Some(code) = self.sessions.unbind(player) else {
            return;
        };
        let Some(room) = self.registry.get_mut(&code) else {
            return;
        };

        match room.remove_player(player) {
            LeaveOutcome::NotMember => {}
            LeaveOutcome::Empty => {
                self.registry.delete(&code);
            }
            LeaveOutcome::Remaining { end, .. } => {
                let mut events = vec![RoomEvent::PlayerLeft {
                    player_id: player,
                    room: room.snapshot(),
                }];
                if let Some(end) = end {
                    events.push(finished_event(room, end));
                }
                for event in events {
                    self.sessions.broadcast(&code, &ServerPayload::Event(event));
                }
            }
        }
    }

    fn time_up(&mut self, code: &RoomCode, round: u64) {
        let Some(room) = self.registry.get_mut(code) else {
            debug!(room_code = %code, "time up for a deleted room");
            return;
        };
        if let Some(end) = room.time_up(round) {
            let event = finished_event(room, end);
            self.sessions.broadcast(code, &ServerPayload::Event(event));
        }
    }

    fn sweep(&mut self) {
        for code in self.registry.sweep_expired() {
            self.sessions.broadcast(
                &code,
                &ServerPayload::Event(RoomEvent::RoomExpired {
                    room_code: code.clone(),
                }),
            );
            let unbound = self.sessions.unbind_all(&code);
            info!(room_code = %code, players = unbound.len(), "room expired");
        }
    }

    // -- Helpers ----------------------------------------------------------

    fn bind(&mut self, player: PlayerId, code: &RoomCode) {
        if let Err(e) = self.sessions.bind(player, code.clone()) {
            debug!(%player, error = %e, "bind for unknown session");
        }
    }

    fn bound_room(&self, player: PlayerId) -> Result<RoomCode, RoomError> {
        self.sessions
            .room_of(player)
            .cloned()
            .ok_or(RoomError::NoRoom)
    }

    fn room_mut(&mut self, code: &RoomCode) -> Result<&mut Room, RoomError> {
        self.registry
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}

fn finished_event(room: &Room, end: GameEnd) -> RoomEvent {
    RoomEvent::GameFinished {
        winner: end.winner.and_then(|id| room.player(id)).map(Player::snapshot),
        results: end.results,
        room: room.snapshot(),
        reason: end.reason,
    }
}

/// Trims a client-supplied name and caps its length.
fn display_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        trimmed.chars().take(MAX_NAME_CHARS).collect()
    }
}

fn settings_request(
    word_length: Option<Loose>,
    difficulty: Option<Loose>,
    game_mode: Option<Loose>,
    time_limit: Option<Loose>,
) -> SettingsRequest {
    SettingsRequest {
        word_length: word_length.as_ref().and_then(Loose::as_number),
        difficulty: difficulty.as_ref().and_then(Loose::to_text),
        game_mode: game_mode.as_ref().and_then(Loose::to_text),
        time_limit: time_limit.as_ref().and_then(Loose::as_number),
    }
}

// =========================================================================
// Tests
// =========================================================================
