//! Integration tests for the room state machine, driven by a manual clock
//! and an in-memory word catalog.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use wordrace_clock::{Clock, ManualClock};
use wordrace_protocol::{FinishReason, PlayerId, RoomCode, RoomStatus};
use wordrace_room::{
    JoinCommand, LeaveOutcome, ProgressOutcome, ProgressUpdate, Room, RoomConfig, RoomError,
    RoomSettings, SettingsRequest,
};
use wordrace_words::{Difficulty, GameMode, WordCatalog, WordLength};

// =========================================================================
// Helpers
// =========================================================================

const WORDS: [&str; 4] = ["apple", "crane", "slate", "trick"];

fn catalog() -> WordCatalog {
    WordCatalog::in_memory().with_list(
        WordLength::Five,
        Difficulty::Easy,
        WORDS.iter().map(|w| w.to_string()).collect(),
    )
}

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

fn join(id: u64) -> JoinCommand {
    JoinCommand {
        player: pid(id),
        name: format!("p{id}"),
    }
}

fn race() -> RoomSettings {
    RoomSettings::default()
}

fn timed(minutes: u64) -> RoomSettings {
    RoomSettings::resolve(
        &SettingsRequest {
            game_mode: Some("timed".into()),
            time_limit: Some(minutes),
            ..SettingsRequest::default()
        },
        None,
    )
}

fn room_with(settings: RoomSettings, config: RoomConfig) -> (Room, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(10_000));
    let room = Room::new(
        RoomCode::parse("123456").unwrap(),
        join(1),
        settings,
        config,
        clock.clone(),
    );
    (room, clock)
}

/// Host 1 plus `others`, everyone ready.
fn ready_room(settings: RoomSettings, others: &[u64]) -> (Room, Arc<ManualClock>) {
    let (mut room, clock) = room_with(settings, RoomConfig::default());
    for &id in others {
        room.add_player(join(id)).unwrap();
        room.set_ready(pid(id), true).unwrap();
    }
    (room, clock)
}

fn progress(attempts: u32, won: bool, correct: u32) -> ProgressUpdate {
    ProgressUpdate {
        progress: attempts,
        won,
        correct_count: Some(correct),
    }
}

fn hosts(room: &Room) -> usize {
    room.players().iter().filter(|p| p.is_host).count()
}

// =========================================================================
// Roster
// =========================================================================

#[test]
fn test_host_is_ready_and_unique() {
    let (mut room, _clock) = room_with(race(), RoomConfig::default());
    room.add_player(join(2)).unwrap();

    assert_eq!(hosts(&room), 1);
    assert_eq!(room.host_id(), pid(1));
    assert!(room.player(pid(1)).unwrap().ready);
    assert!(!room.player(pid(2)).unwrap().ready);
}

#[test]
fn test_host_cannot_unready() {
    let (mut room, _clock) = room_with(race(), RoomConfig::default());
    room.set_ready(pid(1), false).unwrap();
    assert!(room.player(pid(1)).unwrap().ready);
}

#[test]
fn test_set_ready_unknown_player() {
    let (mut room, _clock) = room_with(race(), RoomConfig::default());
    let err = room.set_ready(pid(9), true).unwrap_err();
    assert!(matches!(err, RoomError::NotInRoom(p, _) if p == pid(9)));
}

#[test]
fn test_rejoin_is_noop() {
    let (mut room, _clock) = room_with(race(), RoomConfig::default());
    room.add_player(join(2)).unwrap();
    room.add_player(join(2)).unwrap();
    assert_eq!(room.len(), 2);
}

#[test]
fn test_capacity_is_enforced() {
    let config = RoomConfig {
        max_players: 3,
        ..RoomConfig::default()
    };
    let (mut room, _clock) = room_with(race(), config);
    room.add_player(join(2)).unwrap();
    room.add_player(join(3)).unwrap();

    let err = room.add_player(join(4)).unwrap_err();
    assert!(matches!(err, RoomError::Full(_)));
    assert_eq!(room.len(), 3);
}

#[test]
fn test_full_is_reported_before_started() {
    let config = RoomConfig {
        max_players: 2,
        ..RoomConfig::default()
    };
    let (mut room, _clock) = room_with(race(), config);
    room.add_player(join(2)).unwrap();
    room.set_ready(pid(2), true).unwrap();
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();

    assert!(matches!(room.add_player(join(3)), Err(RoomError::Full(_))));
}

#[test]
fn test_join_after_start_rejected() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();

    let err = room.add_player(join(3)).unwrap_err();
    assert!(matches!(err, RoomError::AlreadyStarted(_)));
    assert_eq!(err.code().as_str(), "game_started");
}

#[test]
fn test_check_join_leaves_room_untouched() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    assert!(room.check_join(pid(3)).is_ok());
    assert_eq!(room.len(), 2);

    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();
    assert!(matches!(
        room.check_join(pid(3)),
        Err(RoomError::AlreadyStarted(_))
    ));
    // Members pass, since joining again is a no-op.
    assert!(room.check_join(pid(2)).is_ok());
    assert_eq!(room.len(), 2);
}

#[test]
fn test_host_leaves_next_player_promoted() {
    let (mut room, _clock) = ready_room(race(), &[2, 3]);

    let outcome = room.remove_player(pid(1));

    assert_eq!(
        outcome,
        LeaveOutcome::Remaining {
            new_host: Some(pid(2)),
            end: None,
        }
    );
    assert_eq!(room.host_id(), pid(2));
    assert_eq!(hosts(&room), 1);
    assert!(room.player(pid(2)).unwrap().ready);
}

#[test]
fn test_last_player_leaving_empties_room() {
    let (mut room, _clock) = room_with(race(), RoomConfig::default());
    assert_eq!(room.remove_player(pid(1)), LeaveOutcome::Empty);
    assert!(room.is_empty());
    assert_eq!(room.remove_player(pid(1)), LeaveOutcome::NotMember);
}

// =========================================================================
// Settings
// =========================================================================

#[test]
fn test_settings_change_resets_ready() {
    let (mut room, _clock) = ready_room(race(), &[2, 3]);

    let settings = *room
        .update_settings(
            pid(1),
            &SettingsRequest {
                word_length: Some(6),
                ..SettingsRequest::default()
            },
        )
        .unwrap();

    assert_eq!(settings.word_length, WordLength::Six);
    assert_eq!(settings.difficulty, Difficulty::Imdt);
    assert!(room.player(pid(1)).unwrap().ready);
    assert!(!room.player(pid(2)).unwrap().ready);
    assert!(!room.player(pid(3)).unwrap().ready);
}

#[test]
fn test_settings_non_host_rejected() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    let err = room
        .update_settings(pid(2), &SettingsRequest::default())
        .unwrap_err();
    assert!(matches!(err, RoomError::NotHost(p) if p == pid(2)));
    assert!(room.player(pid(2)).unwrap().ready);
}

#[test]
fn test_settings_during_game_rejected() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();

    let err = room
        .update_settings(pid(1), &SettingsRequest::default())
        .unwrap_err();
    assert!(matches!(err, RoomError::GameInProgress));
}

// =========================================================================
// Starting
// =========================================================================

#[test]
fn test_start_requires_host() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    let err = room.start_game(pid(2), &mut catalog(), |_| {}).unwrap_err();
    assert!(matches!(err, RoomError::NotHost(_)));
    assert_eq!(room.status(), RoomStatus::Waiting);
}

#[test]
fn test_start_requires_min_players() {
    let (mut room, _clock) = room_with(race(), RoomConfig::default());
    let err = room.start_game(pid(1), &mut catalog(), |_| {}).unwrap_err();
    assert!(matches!(err, RoomError::PlayersNotReady));
}

#[test]
fn test_start_requires_everyone_ready() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    room.add_player(join(3)).unwrap();

    let err = room.start_game(pid(1), &mut catalog(), |_| {}).unwrap_err();
    assert!(matches!(err, RoomError::PlayersNotReady));
    assert_eq!(room.status(), RoomStatus::Waiting);
}

#[test]
fn test_start_without_word_list() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    let mut empty = WordCatalog::in_memory();

    let err = room.start_game(pid(1), &mut empty, |_| {}).unwrap_err();
    assert_eq!(err.code().as_str(), "word_list_unavailable");
    assert_eq!(room.status(), RoomStatus::Waiting);
}

#[test]
fn test_start_with_empty_word_list() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    let mut empty = WordCatalog::in_memory().with_list(WordLength::Five, Difficulty::Easy, vec![]);

    let err = room.start_game(pid(1), &mut empty, |_| {}).unwrap_err();
    assert!(matches!(
        err,
        RoomError::WordListUnavailable { source: None, .. }
    ));
}

#[test]
fn test_race_start_picks_index_in_range() {
    let (mut room, clock) = ready_room(race(), &[2]);
    let start = room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();

    assert!(start.word_index < WORDS.len());
    assert!(start.word_indices.is_none());
    assert_eq!(room.status(), RoomStatus::Playing);
    assert_eq!(room.start_time(), Some(clock.now()));
    assert_eq!(room.end_time(), None);
    assert!(!room.has_pending_timer());
    assert_eq!(room.snapshot().word_index, Some(start.word_index));
}

#[test]
fn test_timed_start_shuffles_every_index() {
    let (mut room, clock) = ready_room(timed(5), &[2]);
    let start = room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();

    let order = start.word_indices.clone().unwrap();
    let unique: HashSet<usize> = order.iter().copied().collect();
    assert_eq!(order.len(), WORDS.len());
    assert_eq!(unique, (0..WORDS.len()).collect::<HashSet<_>>());
    assert_eq!(start.word_index, order[0]);
    assert_eq!(room.word_order(), Some(order.as_slice()));
    assert_eq!(room.end_time(), Some(clock.now() + 5 * 60 * 1000));
    assert!(room.has_pending_timer());
}

#[test]
fn test_snapshot_hides_word_index_in_lobby() {
    let (room, _clock) = ready_room(race(), &[2]);
    let snapshot = room.snapshot();
    assert_eq!(snapshot.word_index, None);
    assert_eq!(snapshot.players.len(), 2);
    assert_eq!(snapshot.max_players, 10);
}

// =========================================================================
// Race mode
// =========================================================================

#[test]
fn test_race_back_to_back_wins_first_one_commits() {
    let (mut room, clock) = ready_room(race(), &[2]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();
    clock.advance(Duration::from_secs(7));

    let first = room.update_progress(pid(1), progress(2, true, 5));
    let second = room.update_progress(pid(2), progress(2, true, 5));

    let ProgressOutcome::Finished { end, .. } = first else {
        panic!("expected the first win to finish, got {first:?}");
    };
    assert_eq!(end.winner, Some(pid(1)));
    assert_eq!(second, ProgressOutcome::Ignored);

    let winner = room.player(pid(1)).unwrap();
    let loser = room.player(pid(2)).unwrap();
    assert!(winner.won && winner.finished);
    assert!(!loser.won);
    assert!(loser.finished);
    assert_eq!(loser.finish_time, winner.finish_time);
    assert_eq!(loser.finish_time, Some(7_000));
    assert_eq!(end.results[0].player_id, pid(1));
    assert!(!end.results[1].won);
}

#[test]
fn test_race_win_ends_game_for_everyone() {
    let (mut room, clock) = ready_room(race(), &[2]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();

    clock.advance(Duration::from_secs(12));
    let outcome = room.update_progress(pid(2), progress(3, true, 5));

    let ProgressOutcome::Finished { echo, end } = outcome else {
        panic!("expected game to finish, got {outcome:?}");
    };
    assert!(echo.won);
    assert_eq!(end.winner, Some(pid(2)));
    assert_eq!(end.reason, None);
    assert_eq!(room.status(), RoomStatus::Finished);

    assert_eq!(end.results[0].player_id, pid(2));
    assert!(end.results[0].won);
    assert_eq!(end.results[0].time, 12_000);
    assert_eq!(end.results[1].player_id, pid(1));
    assert!(!end.results[1].won);
    assert_eq!(end.results[1].time, 12_000);

    let host = room.player(pid(1)).unwrap();
    assert!(host.finished);
    assert!(!host.won);
    assert_eq!(room.results(), end.results.as_slice());
}

#[test]
fn test_race_exhausting_attempts_finishes_player() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();

    let outcome = room.update_progress(pid(2), progress(6, false, 3));
    assert!(matches!(outcome, ProgressOutcome::Continuing { .. }));
    assert!(room.player(pid(2)).unwrap().finished);

    // Reports from a finished player change nothing.
    assert_eq!(
        room.update_progress(pid(2), progress(6, true, 5)),
        ProgressOutcome::Ignored
    );
    assert_eq!(room.status(), RoomStatus::Playing);
}

#[test]
fn test_race_all_exhausted_ends_without_winner() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();

    room.update_progress(pid(1), progress(6, false, 2));
    let outcome = room.update_progress(pid(2), progress(6, false, 4));

    let ProgressOutcome::Finished { end, .. } = outcome else {
        panic!("expected game to finish, got {outcome:?}");
    };
    assert_eq!(end.winner, None);
    // Nobody won, so more correct letters ranks first.
    assert_eq!(end.results[0].player_id, pid(2));
    assert_eq!(end.results[1].player_id, pid(1));
}

#[test]
fn test_progress_values_are_clamped() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();

    let outcome = room.update_progress(pid(2), progress(2, false, 40));
    let echo = outcome.echo().copied().unwrap();
    assert_eq!(echo.correct_count, 5);
    assert_eq!(echo.progress, 2);

    let outcome = room.update_progress(pid(1), progress(200, false, 0));
    assert_eq!(outcome.echo().unwrap().progress, 6);
}

#[test]
fn test_progress_ignored_outside_game() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    assert_eq!(
        room.update_progress(pid(2), progress(1, false, 1)),
        ProgressOutcome::Ignored
    );
    assert_eq!(room.player(pid(2)).unwrap().progress, 0);
}

#[test]
fn test_race_leave_leaving_only_finished_players_ends_game() {
    let (mut room, _clock) = ready_room(race(), &[2, 3]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();
    room.update_progress(pid(1), progress(6, false, 1));
    room.update_progress(pid(2), progress(6, false, 2));

    let LeaveOutcome::Remaining { end, .. } = room.remove_player(pid(3)) else {
        panic!("players remain");
    };
    let end = end.expect("game should end");
    assert_eq!(end.winner, None);
    assert_eq!(end.reason, None);
    assert_eq!(room.status(), RoomStatus::Finished);
}

// =========================================================================
// Timed mode
// =========================================================================

#[test]
fn test_timed_pointers_advance_independently() {
    let (mut room, _clock) = ready_room(timed(3), &[2]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();

    let outcome = room.update_progress(pid(1), progress(2, true, 5));
    assert!(matches!(
        outcome,
        ProgressOutcome::NextWord { word_pointer: 1, .. }
    ));
    let outcome = room.update_progress(pid(1), progress(6, false, 1));
    assert!(matches!(
        outcome,
        ProgressOutcome::NextWord { word_pointer: 2, .. }
    ));
    let outcome = room.update_progress(pid(2), progress(1, false, 2));
    assert!(matches!(outcome, ProgressOutcome::Continuing { .. }));

    let host = room.player(pid(1)).unwrap();
    assert_eq!(host.current_word_index, 2);
    assert_eq!(host.solved_count, 1);
    assert_eq!(host.progress, 0);
    assert_eq!(host.correct_count, 0);

    let guest = room.player(pid(2)).unwrap();
    assert_eq!(guest.current_word_index, 0);
    assert_eq!(guest.progress, 1);
    assert_eq!(room.status(), RoomStatus::Playing);
}

#[test]
fn test_timed_game_ends_when_time_is_up() {
    let (mut room, clock) = ready_room(timed(3), &[2]);
    let (tx, rx) = mpsc::channel();
    room.start_game(pid(1), &mut catalog(), move |round| {
        tx.send(round).unwrap();
    })
    .unwrap();

    room.update_progress(pid(2), progress(3, true, 5));
    room.update_progress(pid(2), progress(4, true, 5));
    room.update_progress(pid(1), progress(2, true, 5));

    assert_eq!(clock.advance(Duration::from_secs(179)), 0);
    assert_eq!(clock.advance(Duration::from_secs(1)), 1);
    let round = rx.try_recv().unwrap();

    let end = room.time_up(round).expect("time up should end the game");
    assert_eq!(end.reason, Some(FinishReason::TimeUp));
    assert_eq!(end.winner, None);
    assert_eq!(end.results[0].player_id, pid(2));
    assert_eq!(end.results[0].solved_count, 2);
    assert!(end.results[0].won);
    assert_eq!(end.results[1].player_id, pid(1));
    assert!(!end.results[1].won);
    assert!(end.results.iter().all(|r| r.time == 180_000));
    assert_eq!(room.status(), RoomStatus::Finished);
    assert!(!room.has_pending_timer());
}

#[test]
fn test_stale_time_up_is_ignored() {
    let (mut room, clock) = ready_room(timed(3), &[2]);
    let (tx, rx) = mpsc::channel();
    let first_tx = tx.clone();
    room.start_game(pid(1), &mut catalog(), move |round| {
        first_tx.send(round).unwrap();
    })
    .unwrap();
    let first_round = room.round();

    // End the first game early with a walkover, then start again.
    room.remove_player(pid(2));
    room.add_player(join(2)).unwrap_err();
    room.play_again(pid(1)).unwrap();
    room.add_player(join(2)).unwrap();
    room.set_ready(pid(2), true).unwrap();
    room.start_game(pid(1), &mut catalog(), move |round| {
        tx.send(round).unwrap();
    })
    .unwrap();

    // The first timer was cancelled by the walkover; a late fire is a no-op.
    assert!(room.time_up(first_round).is_none());
    assert_eq!(room.status(), RoomStatus::Playing);

    clock.advance(Duration::from_secs(180));
    let round = rx.try_recv().unwrap();
    assert_eq!(round, room.round());
    assert!(rx.try_recv().is_err());
    assert!(room.time_up(round).is_some());
}

#[test]
fn test_time_up_in_lobby_is_ignored() {
    let (mut room, _clock) = ready_room(timed(3), &[2]);
    assert!(room.time_up(0).is_none());
    assert_eq!(room.status(), RoomStatus::Waiting);
}

// =========================================================================
// Walkover
// =========================================================================

#[test]
fn test_walkover_when_one_player_remains() {
    let (mut room, clock) = ready_room(race(), &[2, 3]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();
    clock.advance(Duration::from_secs(5));

    let first = room.remove_player(pid(2));
    assert_eq!(
        first,
        LeaveOutcome::Remaining {
            new_host: None,
            end: None,
        }
    );
    assert_eq!(room.status(), RoomStatus::Playing);

    let LeaveOutcome::Remaining { new_host, end } = room.remove_player(pid(1)) else {
        panic!("one player remains");
    };
    assert_eq!(new_host, Some(pid(3)));
    let end = end.expect("walkover should end the game");
    assert_eq!(end.reason, Some(FinishReason::InsufficientPlayers));
    assert_eq!(end.winner, Some(pid(3)));
    assert_eq!(end.results.len(), 1);
    assert!(end.results[0].won);

    let last = room.player(pid(3)).unwrap();
    assert!(last.is_host);
    assert!(last.finished);
    assert!(last.won);
    assert_eq!(last.finish_time, Some(5_000));
    assert_eq!(room.status(), RoomStatus::Finished);
}

#[test]
fn test_walkover_cancels_time_limit() {
    let (mut room, clock) = ready_room(timed(3), &[2]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();
    assert_eq!(clock.pending(), 1);

    room.remove_player(pid(2));
    assert_eq!(clock.pending(), 0);
    assert_eq!(room.status(), RoomStatus::Finished);
}

#[test]
fn test_leave_in_lobby_never_finishes() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    room.remove_player(pid(2));
    assert_eq!(room.status(), RoomStatus::Waiting);
}

// =========================================================================
// Play again
// =========================================================================

#[test]
fn test_play_again_resets_room() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();
    room.update_progress(pid(2), progress(1, true, 5));

    room.play_again(pid(1)).unwrap();

    assert_eq!(room.status(), RoomStatus::Waiting);
    assert!(room.results().is_empty());
    assert_eq!(room.start_time(), None);
    assert_eq!(room.word_index(), None);
    let guest = room.player(pid(2)).unwrap();
    assert!(!guest.ready);
    assert!(!guest.finished);
    assert!(!guest.won);
    assert_eq!(guest.progress, 0);
    assert!(room.player(pid(1)).unwrap().ready);

    // And a new game can be played.
    room.set_ready(pid(2), true).unwrap();
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();
    assert_eq!(room.round(), 2);
}

#[test]
fn test_play_again_rules() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();

    assert!(matches!(
        room.play_again(pid(2)),
        Err(RoomError::NotHost(_))
    ));
    assert!(matches!(
        room.play_again(pid(1)),
        Err(RoomError::GameInProgress)
    ));
}

#[test]
fn test_start_while_finished_rejected() {
    let (mut room, _clock) = ready_room(race(), &[2]);
    room.start_game(pid(1), &mut catalog(), |_| {}).unwrap();
    room.update_progress(pid(1), progress(1, true, 5));

    let err = room.start_game(pid(1), &mut catalog(), |_| {}).unwrap_err();
    assert!(matches!(err, RoomError::GameInProgress));
}

#[test]
fn test_preview_summarizes_room() {
    let (room, _clock) = ready_room(timed(10), &[2]);
    let preview = room.preview();
    assert_eq!(preview.code.as_str(), "123456");
    assert_eq!(preview.game_mode, GameMode::Timed);
    assert_eq!(preview.time_limit.map(|t| t.minutes()), Some(10));
    assert_eq!(preview.player_count, 2);
    assert_eq!(preview.max_players, 10);
    assert_eq!(preview.status, RoomStatus::Waiting);
}
