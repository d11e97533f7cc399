//! The room state machine: roster, settings, per-player progress, and
//! ranking for one game session.
//!
//! A `Room` is plain data plus synchronous methods. It never blocks and never
//! touches the network; the only side effect it can cause is the time-limit
//! timer, which it requests from the injected [`Clock`].
//!
//! ```text
//! Waiting ──start_game──→ Playing ──(win / all done / time up / walkover)──→ Finished
//!    ↑                                                                          │
//!    └───────────────────────────────play_again─────────────────────────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};
use wordrace_clock::{Clock, TimerHandle, Timestamp};
use wordrace_protocol::{
    FinishReason, PlayerId, PlayerResult, PlayerSnapshot, RoomCode, RoomPreview, RoomSnapshot,
    RoomStatus,
};
use wordrace_words::{GameMode, WordCatalog};

use crate::{
    GameEnd, GameStart, JoinCommand, LeaveOutcome, ProgressEcho, ProgressOutcome, ProgressUpdate,
    RoomConfig, RoomError, RoomSettings, SettingsRequest,
};

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One participant. Owned by exactly one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    /// Hosts are always ready.
    pub ready: bool,
    /// Attempts used on the active puzzle.
    pub progress: u8,
    /// Correctly placed letters in the latest guess.
    pub correct_count: u8,
    /// Puzzles solved this game (timed mode).
    pub solved_count: u32,
    /// Position in the shared shuffled order (timed mode).
    pub current_word_index: usize,
    pub finished: bool,
    /// Milliseconds from game start to finishing.
    pub finish_time: Option<u64>,
    pub won: bool,
}

impl Player {
    fn new(id: PlayerId, name: String, is_host: bool) -> Self {
        Self {
            id,
            name,
            is_host,
            ready: is_host,
            progress: 0,
            correct_count: 0,
            solved_count: 0,
            current_word_index: 0,
            finished: false,
            finish_time: None,
            won: false,
        }
    }

    /// Clears everything that belongs to a single game.
    fn reset_counters(&mut self) {
        self.progress = 0;
        self.correct_count = 0;
        self.solved_count = 0;
        self.current_word_index = 0;
        self.finished = false;
        self.finish_time = None;
        self.won = false;
    }

    fn finish(&mut self, won: bool, elapsed: u64) {
        self.finished = true;
        self.won = won;
        self.finish_time = Some(elapsed);
    }

    /// Public view of this player.
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            name: self.name.clone(),
            is_host: self.is_host,
            ready: self.ready,
            progress: self.progress,
            correct_count: self.correct_count,
            solved_count: self.solved_count,
            current_word_index: self.current_word_index,
            finished: self.finished,
            won: self.won,
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One isolated game session.
pub struct Room {
    code: RoomCode,
    host_id: PlayerId,
    settings: RoomSettings,
    config: RoomConfig,
    status: RoomStatus,
    /// Insertion order; the head is next in line for host.
    players: Vec<Player>,
    word_index: Option<usize>,
    word_order: Option<Vec<usize>>,
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
    results: Vec<PlayerResult>,
    created_at: Timestamp,
    /// Bumped on every start so a timer from an earlier game can't end this one.
    round: u64,
    timer: Option<TimerHandle>,
    clock: Arc<dyn Clock>,
}

impl Room {
    /// Creates a room in the lobby with `host` as its only player.
    pub fn new(
        code: RoomCode,
        host: JoinCommand,
        settings: RoomSettings,
        config: RoomConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let created_at = clock.now();
        Self {
            code,
            host_id: host.player,
            settings,
            config,
            status: RoomStatus::Waiting,
            players: vec![Player::new(host.player, host.name, true)],
            word_index: None,
            word_order: None,
            start_time: None,
            end_time: None,
            results: Vec::new(),
            created_at,
            round: 0,
            timer: None,
            clock,
        }
    }

    // -- Accessors --------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host_id(&self) -> PlayerId {
        self.host_id
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    /// Players in insertion order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn max_players(&self) -> usize {
        self.config.max_players
    }

    /// Final ranking. Empty unless the room is `finished`.
    pub fn results(&self) -> &[PlayerResult] {
        &self.results
    }

    pub fn word_index(&self) -> Option<usize> {
        self.word_index
    }

    /// The shuffled puzzle order of the current timed game.
    pub fn word_order(&self) -> Option<&[usize]> {
        self.word_order.as_deref()
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        self.end_time
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Number of games started in this room so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Returns `true` while a time-limit timer is armed.
    pub fn has_pending_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    // -- Roster -----------------------------------------------------------

    /// Checks whether `player` could join right now, without joining.
    ///
    /// # Errors
    /// - [`RoomError::Full`] at capacity (checked first).
    /// - [`RoomError::AlreadyStarted`] outside the lobby.
    pub fn check_join(&self, player: PlayerId) -> Result<(), RoomError> {
        if self.contains(player) {
            return Ok(());
        }
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::Full(self.code.clone()));
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::AlreadyStarted(self.code.clone()));
        }
        Ok(())
    }

    /// Adds a player to the lobby.
    ///
    /// Joining a room you're already in succeeds without changes. Fails the
    /// same way [`check_join`](Self::check_join) does.
    pub fn add_player(&mut self, cmd: JoinCommand) -> Result<&Player, RoomError> {
        if let Some(idx) = self.index_of(cmd.player) {
            return Ok(&self.players[idx]);
        }
        self.check_join(cmd.player)?;

        let idx = self.players.len();
        self.players.push(Player::new(cmd.player, cmd.name, false));
        debug!(
            room_code = %self.code,
            player_id = %cmd.player,
            players = self.players.len(),
            "player joined"
        );
        Ok(&self.players[idx])
    }

    /// Removes a player, handing off host and ending the game if needed.
    pub fn remove_player(&mut self, id: PlayerId) -> LeaveOutcome {
        let Some(idx) = self.index_of(id) else {
            return LeaveOutcome::NotMember;
        };
        let leaving = self.players.remove(idx);
        debug!(
            room_code = %self.code,
            player_id = %id,
            players = self.players.len(),
            "player left"
        );

        if self.players.is_empty() {
            self.cancel_timer();
            return LeaveOutcome::Empty;
        }

        let new_host = if leaving.is_host {
            let next = &mut self.players[0];
            next.is_host = true;
            next.ready = true;
            self.host_id = next.id;
            info!(room_code = %self.code, player_id = %next.id, "host reassigned");
            Some(next.id)
        } else {
            None
        };

        let end = if self.status != RoomStatus::Playing {
            None
        } else if self.players.len() == 1 {
            Some(self.walkover())
        } else if self.settings.game_mode == GameMode::Race
            && self.players.iter().all(|p| p.finished)
        {
            // Everyone still here had already run out of attempts.
            Some(self.finish_game(None, None))
        } else {
            None
        };

        LeaveOutcome::Remaining { new_host, end }
    }

    /// Sets a player's ready flag. The host's flag can't be cleared.
    ///
    /// # Errors
    /// [`RoomError::NotInRoom`] if the player isn't here.
    pub fn set_ready(&mut self, id: PlayerId, ready: bool) -> Result<(), RoomError> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| RoomError::NotInRoom(id, self.code.clone()))?;
        let player = &mut self.players[idx];
        if !player.is_host {
            player.ready = ready;
        }
        Ok(())
    }

    // -- Lobby ------------------------------------------------------------

    /// Applies a host's settings change and clears every other player's
    /// ready flag.
    ///
    /// # Errors
    /// - [`RoomError::NotHost`] if `caller` isn't the host.
    /// - [`RoomError::GameInProgress`] outside the lobby.
    pub fn update_settings(
        &mut self,
        caller: PlayerId,
        request: &SettingsRequest,
    ) -> Result<&RoomSettings, RoomError> {
        if caller != self.host_id {
            return Err(RoomError::NotHost(caller));
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameInProgress);
        }

        self.settings = RoomSettings::resolve(request, Some(&self.settings));
        for player in self.players.iter_mut().filter(|p| !p.is_host) {
            player.ready = false;
        }
        info!(
            room_code = %self.code,
            word_length = %self.settings.word_length,
            difficulty = %self.settings.difficulty,
            game_mode = %self.settings.game_mode,
            "room settings updated"
        );
        Ok(&self.settings)
    }

    /// Starts a game: picks the puzzle(s), resets per-game counters, and in
    /// timed mode arms the time-limit timer.
    ///
    /// When the timer fires it calls `on_time_up` with this game's round
    /// number, which should be fed back into [`time_up`](Self::time_up).
    ///
    /// # Errors
    /// Checked in this order:
    /// - [`RoomError::NotHost`]
    /// - [`RoomError::GameInProgress`] unless the room is waiting
    /// - [`RoomError::PlayersNotReady`] if too few players or anyone unready
    /// - [`RoomError::WordListUnavailable`] if the list is missing or empty
    pub fn start_game(
        &mut self,
        caller: PlayerId,
        words: &mut WordCatalog,
        on_time_up: impl FnOnce(u64) + Send + 'static,
    ) -> Result<GameStart, RoomError> {
        if caller != self.host_id {
            return Err(RoomError::NotHost(caller));
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameInProgress);
        }
        if self.players.len() < self.config.min_players || self.players.iter().any(|p| !p.ready) {
            return Err(RoomError::PlayersNotReady);
        }

        let RoomSettings {
            word_length,
            difficulty,
            game_mode,
            time_limit,
        } = self.settings;
        let list = words.word_list(word_length, difficulty).map_err(|e| {
            warn!(room_code = %self.code, error = %e, "word list unavailable");
            RoomError::WordListUnavailable {
                length: word_length,
                difficulty,
                source: Some(e),
            }
        })?;
        if list.is_empty() {
            warn!(room_code = %self.code, %word_length, %difficulty, "word list is empty");
            return Err(RoomError::WordListUnavailable {
                length: word_length,
                difficulty,
                source: None,
            });
        }

        let mut rng = rand::rng();
        let (word_index, word_indices) = match game_mode {
            GameMode::Race => (rng.random_range(0..list.len()), None),
            GameMode::Timed => {
                let mut order: Vec<usize> = (0..list.len()).collect();
                order.shuffle(&mut rng);
                (order[0], Some(order))
            }
        };

        let now = self.clock.now();
        self.cancel_timer();
        self.round += 1;
        self.status = RoomStatus::Playing;
        self.word_index = Some(word_index);
        self.word_order = word_indices.clone();
        self.start_time = Some(now);
        self.end_time = None;
        self.results.clear();
        for player in &mut self.players {
            player.reset_counters();
        }

        if let (GameMode::Timed, Some(limit)) = (game_mode, time_limit) {
            self.end_time = Some(now + limit.duration().as_millis() as Timestamp);
            let round = self.round;
            self.timer = Some(
                self.clock
                    .schedule(limit.duration(), Box::new(move || on_time_up(round))),
            );
        }

        info!(
            room_code = %self.code,
            %game_mode,
            round = self.round,
            players = self.players.len(),
            "game started"
        );
        Ok(GameStart {
            word_index,
            word_indices,
        })
    }

    // -- Play -------------------------------------------------------------

    /// Records one progress report.
    ///
    /// `progress` is clamped to the attempt limit and `correct_count` to the
    /// word length. Reports outside of a running game are ignored.
    pub fn update_progress(&mut self, id: PlayerId, update: ProgressUpdate) -> ProgressOutcome {
        if self.status != RoomStatus::Playing {
            return ProgressOutcome::Ignored;
        }
        let Some(idx) = self.index_of(id) else {
            return ProgressOutcome::Ignored;
        };

        let letters = u32::from(self.settings.word_length.letters());
        let echo = ProgressEcho {
            progress: update.progress.min(u32::from(self.config.max_attempts)) as u8,
            won: update.won,
            correct_count: update.correct_count.unwrap_or(0).min(letters) as u8,
        };

        match self.settings.game_mode {
            GameMode::Race => self.race_progress(idx, echo),
            GameMode::Timed => self.timed_progress(idx, echo),
        }
    }

    /// First correct guess ends the game for everyone.
    fn race_progress(&mut self, idx: usize, echo: ProgressEcho) -> ProgressOutcome {
        if self.players[idx].finished {
            return ProgressOutcome::Ignored;
        }
        let elapsed = self.elapsed();
        let max_attempts = self.config.max_attempts;

        let player = &mut self.players[idx];
        player.progress = echo.progress;
        player.correct_count = echo.correct_count;

        if echo.won {
            player.finish(true, elapsed);
            let winner = player.id;
            for other in self.players.iter_mut().filter(|p| !p.finished) {
                other.finish(false, elapsed);
            }
            let end = self.finish_game(Some(winner), None);
            return ProgressOutcome::Finished { echo, end };
        }

        if echo.progress >= max_attempts {
            player.finish(false, elapsed);
        }

        if self.players.iter().all(|p| p.finished) {
            let end = self.finish_game(None, None);
            return ProgressOutcome::Finished { echo, end };
        }
        ProgressOutcome::Continuing { echo }
    }

    /// Solving or running out of attempts moves the player to their next
    /// puzzle. Only the clock (or a walkover) ends a timed game.
    fn timed_progress(&mut self, idx: usize, echo: ProgressEcho) -> ProgressOutcome {
        let max_attempts = self.config.max_attempts;
        let player = &mut self.players[idx];
        player.progress = echo.progress;
        player.correct_count = echo.correct_count;

        if echo.won || echo.progress >= max_attempts {
            if echo.won {
                player.solved_count += 1;
            }
            player.current_word_index += 1;
            player.progress = 0;
            player.correct_count = 0;
            return ProgressOutcome::NextWord {
                echo,
                word_pointer: player.current_word_index,
            };
        }
        ProgressOutcome::Continuing { echo }
    }

    /// Ends a timed game when its timer fires.
    ///
    /// Returns `None` (and does nothing) if the room has moved on since the
    /// timer was armed: a different round, or no longer playing.
    pub fn time_up(&mut self, round: u64) -> Option<GameEnd> {
        if self.status != RoomStatus::Playing
            || round != self.round
            || self.settings.game_mode != GameMode::Timed
        {
            debug!(room_code = %self.code, round, "stale timer ignored");
            return None;
        }
        self.timer = None;
        Some(self.finish_game(None, Some(FinishReason::TimeUp)))
    }

    /// Host resets a finished room back to the lobby.
    ///
    /// # Errors
    /// - [`RoomError::NotHost`] if `caller` isn't the host.
    /// - [`RoomError::GameInProgress`] while a game is running.
    pub fn play_again(&mut self, caller: PlayerId) -> Result<(), RoomError> {
        if caller != self.host_id {
            return Err(RoomError::NotHost(caller));
        }
        if self.status == RoomStatus::Playing {
            return Err(RoomError::GameInProgress);
        }

        self.cancel_timer();
        self.status = RoomStatus::Waiting;
        self.word_index = None;
        self.word_order = None;
        self.start_time = None;
        self.end_time = None;
        self.results.clear();
        for player in &mut self.players {
            player.ready = player.is_host;
            player.reset_counters();
        }
        info!(room_code = %self.code, "room reset");
        Ok(())
    }

    // -- Projection -------------------------------------------------------

    /// The public view sent to clients. Never contains a word, only indices.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            host_id: self.host_id,
            difficulty: self.settings.difficulty,
            word_length: self.settings.word_length,
            max_players: self.config.max_players,
            game_mode: self.settings.game_mode,
            time_limit: self.settings.time_limit,
            status: self.status,
            start_time: self.start_time,
            end_time: self.end_time,
            players: self.players.iter().map(Player::snapshot).collect(),
            word_index: match self.status {
                RoomStatus::Waiting => None,
                _ => self.word_index,
            },
        }
    }

    /// Invite-link summary.
    pub fn preview(&self) -> RoomPreview {
        RoomPreview {
            code: self.code.clone(),
            difficulty: self.settings.difficulty,
            word_length: self.settings.word_length,
            game_mode: self.settings.game_mode,
            time_limit: self.settings.time_limit,
            player_count: self.players.len(),
            max_players: self.config.max_players,
            status: self.status,
        }
    }

    // -- Internals --------------------------------------------------------

    fn index_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Milliseconds since the current game started.
    fn elapsed(&self) -> u64 {
        self.start_time
            .map(|start| self.clock.now().saturating_sub(start))
            .unwrap_or(0)
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    /// The last player standing wins, even if they had already run out of
    /// attempts.
    fn walkover(&mut self) -> GameEnd {
        let elapsed = self.elapsed();
        let last = &mut self.players[0];
        last.finished = true;
        last.won = true;
        last.finish_time.get_or_insert(elapsed);
        let winner = last.id;
        self.finish_game(Some(winner), Some(FinishReason::InsufficientPlayers))
    }

    fn finish_game(&mut self, winner: Option<PlayerId>, reason: Option<FinishReason>) -> GameEnd {
        debug_assert!(self.status.can_transition_to(RoomStatus::Finished));
        self.cancel_timer();
        self.status = RoomStatus::Finished;

        let now = self.elapsed();
        let mut results: Vec<PlayerResult> = self
            .players
            .iter()
            .map(|p| PlayerResult {
                player_id: p.id,
                player_name: p.name.clone(),
                attempts: p.progress,
                time: p.finish_time.unwrap_or(now),
                won: p.won,
                correct_count: p.correct_count,
                solved_count: p.solved_count,
            })
            .collect();
        rank(&mut results, self.settings.game_mode);
        self.results = results.clone();

        info!(
            room_code = %self.code,
            winner = ?winner,
            reason = ?reason,
            players = self.players.len(),
            "game finished"
        );
        GameEnd {
            results,
            winner,
            reason,
        }
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("code", &self.code)
            .field("status", &self.status)
            .field("host_id", &self.host_id)
            .field("settings", &self.settings)
            .field("players", &self.players.len())
            .field("round", &self.round)
            .finish()
    }
}

/// Sorts results best first.
///
/// - Race: winner first, then more correct letters, then faster.
/// - Timed: more puzzles solved, then faster; the leader is flagged as winner.
///
/// The sort is stable, so full ties keep join order.
fn rank(results: &mut [PlayerResult], mode: GameMode) {
    match mode {
        GameMode::Race => results.sort_by(|a, b| {
            b.won
                .cmp(&a.won)
                .then(b.correct_count.cmp(&a.correct_count))
                .then(a.time.cmp(&b.time))
        }),
        GameMode::Timed => {
            results.sort_by(|a, b| {
                b.solved_count
                    .cmp(&a.solved_count)
                    .then(a.time.cmp(&b.time))
            });
            if let Some(first) = results.first_mut() {
                first.won = true;
            }
        }
    }
}
