//! Client requests, server acknowledgements, and room broadcasts.
//!
//! ```text
//! client → server   ClientEnvelope { requestId?, message: ClientMessage }
//! server → client   ServerEnvelope { seq, timestamp, payload }
//!                       payload = { type: "ack",   data: Ack }
//!                               | { type: "event", data: RoomEvent }
//! ```
//!
//! Every request carrying a `requestId` gets exactly one [`Ack`] back with the
//! same id. `update_progress` is fire-and-forget and is never acknowledged.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FinishReason, PlayerId, PlayerResult, PlayerSnapshot, RoomCode, RoomSnapshot};

// ---------------------------------------------------------------------------
// Loose values
// ---------------------------------------------------------------------------

/// A setting value as the client sent it.
///
/// Settings are never rejected, so they arrive untyped and are coerced by
/// the resolvers in `wordrace-words`. Numbers may come in as JSON numbers or
/// as numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Loose(pub serde_json::Value);

impl Loose {
    /// Non-negative integer value, accepting `5` and `"5"` alike.
    pub fn as_number(&self) -> Option<u64> {
        match &self.0 {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Count value, accepting `3`, `"3"`, and `3.0`. Negatives become 0 and
    /// fractions are truncated. `None` for anything non-numeric.
    pub fn as_count(&self) -> Option<u32> {
        let n = match &self.0 {
            serde_json::Value::Number(n) => n.as_f64()?,
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if n.is_nan() {
            return None;
        }
        // Float-to-int casts saturate at u32::MAX.
        Some(n.max(0.0) as u32)
    }

    /// String value, if the client sent a string.
    pub fn as_text(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// The value rendered as text: strings verbatim, numbers in decimal.
    pub fn to_text(&self) -> Option<String> {
        match &self.0 {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Loose {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Requests a client can make.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        #[serde(default)]
        player_name: String,
        difficulty: Option<Loose>,
        game_mode: Option<Loose>,
        time_limit: Option<Loose>,
        word_length: Option<Loose>,
    },
    JoinRoom {
        room_code: Loose,
        #[serde(default)]
        player_name: String,
    },
    SetReady {
        ready: bool,
    },
    UpdateRoomSettings {
        difficulty: Option<Loose>,
        game_mode: Option<Loose>,
        time_limit: Option<Loose>,
        word_length: Option<Loose>,
    },
    StartGame,
    /// Counts arrive untyped and are coerced, never rejected.
    UpdateProgress {
        /// Attempts used so far on the active puzzle.
        #[serde(default)]
        progress: Loose,
        #[serde(default)]
        won: bool,
        /// Correctly placed letters in the latest guess.
        correct_count: Option<Loose>,
    },
    PlayAgain,
    LeaveRoom,
}

impl ClientMessage {
    /// Wire name of the request, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::SetReady { .. } => "set_ready",
            Self::UpdateRoomSettings { .. } => "update_room_settings",
            Self::StartGame => "start_game",
            Self::UpdateProgress { .. } => "update_progress",
            Self::PlayAgain => "play_again",
            Self::LeaveRoom => "leave_room",
        }
    }
}

/// A request plus the correlation id its acknowledgement will echo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEnvelope {
    #[serde(default)]
    pub request_id: Option<u64>,
    pub message: ClientMessage,
}

// ---------------------------------------------------------------------------
// Acknowledgements
// ---------------------------------------------------------------------------

/// Failure categories reported to clients. The wire names are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    RoomFull,
    GameStarted,
    RoomNotFound,
    NotHost,
    PlayersNotReady,
    WordListUnavailable,
    GameInProgress,
    /// The frame could not be decoded as a request.
    InvalidMessage,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoomFull => "room_full",
            Self::GameStarted => "game_started",
            Self::RoomNotFound => "room_not_found",
            Self::NotHost => "not_host",
            Self::PlayersNotReady => "players_not_ready",
            Self::WordListUnavailable => "word_list_unavailable",
            Self::GameInProgress => "game_in_progress",
            Self::InvalidMessage => "invalid_message",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra data returned with a successful acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AckData {
    RoomCreated {
        room_code: RoomCode,
        room: RoomSnapshot,
    },
    RoomJoined {
        room: RoomSnapshot,
    },
    SettingsUpdated {
        room: RoomSnapshot,
    },
    GameStarted {
        word_index: usize,
        word_indices: Option<Vec<usize>>,
    },
}

/// Reply to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub request_id: Option<u64>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AckData>,
}

impl Ack {
    pub fn ok(request_id: Option<u64>, data: Option<AckData>) -> Self {
        Self {
            request_id,
            success: true,
            error: None,
            data,
        }
    }

    pub fn failed(request_id: Option<u64>, code: ErrorCode) -> Self {
        Self {
            request_id,
            success: false,
            error: Some(code),
            data: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Broadcasts
// ---------------------------------------------------------------------------

/// Events pushed to every connection bound to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RoomEvent {
    PlayerJoined {
        player: PlayerSnapshot,
        room: RoomSnapshot,
    },
    RoomUpdated {
        room: RoomSnapshot,
    },
    RoomSettingsUpdated {
        room: RoomSnapshot,
    },
    GameStarted {
        word_index: usize,
        word_indices: Option<Vec<usize>>,
        room: RoomSnapshot,
    },
    ProgressUpdated {
        player_id: PlayerId,
        progress: u8,
        won: bool,
        correct_count: u8,
        /// Timed mode: the player moved on to the next puzzle.
        next_word: bool,
        /// The player's new position in the `wordIndices` order.
        new_word_index: Option<usize>,
        room: RoomSnapshot,
    },
    GameFinished {
        results: Vec<PlayerResult>,
        room: RoomSnapshot,
        winner: Option<PlayerSnapshot>,
        reason: Option<FinishReason>,
    },
    RoomReset {
        room: RoomSnapshot,
    },
    PlayerLeft {
        player_id: PlayerId,
        room: RoomSnapshot,
    },
    /// The room outlived its time-to-live and was removed.
    RoomExpired {
        room_code: RoomCode,
    },
}

impl RoomEvent {
    /// Wire name of the event, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerJoined { .. } => "player_joined",
            Self::RoomUpdated { .. } => "room_updated",
            Self::RoomSettingsUpdated { .. } => "room_settings_updated",
            Self::GameStarted { .. } => "game_started",
            Self::ProgressUpdated { .. } => "progress_updated",
            Self::GameFinished { .. } => "game_finished",
            Self::RoomReset { .. } => "room_reset",
            Self::PlayerLeft { .. } => "player_left",
            Self::RoomExpired { .. } => "room_expired",
        }
    }
}

// ---------------------------------------------------------------------------
// Server envelope
// ---------------------------------------------------------------------------

/// What a server frame carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerPayload {
    Ack(Ack),
    Event(RoomEvent),
}

/// Every server frame on the wire.
///
/// `seq` counts up per connection; `timestamp` is milliseconds since the
/// server started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEnvelope {
    pub seq: u64,
    pub timestamp: u64,
    pub payload: ServerPayload,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_loose_accepts_numbers_and_numeric_strings() {
        assert_eq!(Loose(json!(6)).as_number(), Some(6));
        assert_eq!(Loose(json!("10")).as_number(), Some(10));
        assert_eq!(Loose(json!("ten")).as_number(), None);
        assert_eq!(Loose(json!(-1)).as_number(), None);
        assert_eq!(Loose(serde_json::Value::Null).as_number(), None);
    }

    #[test]
    fn test_loose_to_text() {
        assert_eq!(Loose(json!("123456")).to_text().as_deref(), Some("123456"));
        assert_eq!(Loose(json!(123456)).to_text().as_deref(), Some("123456"));
        assert_eq!(Loose(json!(true)).to_text(), None);
    }

    #[test]
    fn test_create_room_decodes_loose_settings() {
        let json = r#"{
            "requestId": 7,
            "message": {
                "type": "create_room",
                "playerName": "ada",
                "difficulty": "hard",
                "gameMode": "timed",
                "timeLimit": "5",
                "wordLength": 6
            }
        }"#;
        let env: ClientEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.request_id, Some(7));
        match env.message {
            ClientMessage::CreateRoom {
                player_name,
                difficulty,
                time_limit,
                word_length,
                ..
            } => {
                assert_eq!(player_name, "ada");
                assert_eq!(difficulty.unwrap().as_text(), Some("hard"));
                assert_eq!(time_limit.unwrap().as_number(), Some(5));
                assert_eq!(word_length.unwrap().as_number(), Some(6));
            }
            other => panic!("expected CreateRoom, got {other:?}"),
        }
    }

    #[test]
    fn test_create_room_with_no_settings() {
        let json = r#"{"message":{"type":"create_room","playerName":"x"}}"#;
        let env: ClientEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.request_id, None);
        assert!(matches!(
            env.message,
            ClientMessage::CreateRoom {
                difficulty: None,
                word_length: None,
                ..
            }
        ));
    }

    #[test]
    fn test_unit_requests_decode() {
        for (raw, kind) in [
            (r#"{"type":"start_game"}"#, "start_game"),
            (r#"{"type":"play_again"}"#, "play_again"),
            (r#"{"type":"leave_room"}"#, "leave_room"),
        ] {
            let msg: ClientMessage = serde_json::from_str(raw).unwrap();
            assert_eq!(msg.kind(), kind);
        }
    }

    #[test]
    fn test_update_progress_decodes() {
        let raw = r#"{"type":"update_progress","progress":3,"won":false,"correctCount":2}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            ClientMessage::UpdateProgress {
                progress: Loose(json!(3)),
                won: false,
                correct_count: Some(Loose(json!(2))),
            }
        );
    }

    #[test]
    fn test_update_progress_accepts_odd_counts() {
        let raw = r#"{"type":"update_progress","progress":"4","correctCount":-2}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ClientMessage::UpdateProgress {
                progress,
                won,
                correct_count,
            } => {
                assert_eq!(progress.as_count(), Some(4));
                assert!(!won);
                assert_eq!(correct_count.and_then(|c| c.as_count()), Some(0));
            }
            other => panic!("expected UpdateProgress, got {other:?}"),
        }
    }

    #[test]
    fn test_loose_as_count() {
        assert_eq!(Loose(json!(2.9)).as_count(), Some(2));
        assert_eq!(Loose(json!(" 5 ")).as_count(), Some(5));
        assert_eq!(Loose(json!(-1)).as_count(), Some(0));
        assert_eq!(Loose(json!(1e12)).as_count(), Some(u32::MAX));
        assert_eq!(Loose(json!("lots")).as_count(), None);
        assert_eq!(Loose(json!(true)).as_count(), None);
        assert_eq!(Loose::default().as_count(), None);
    }

    #[test]
    fn test_unknown_request_type_fails() {
        let raw = r#"{"type":"launch_rockets"}"#;
        assert!(serde_json::from_str::<ClientMessage>(raw).is_err());
    }

    #[test]
    fn test_failed_ack_wire_format() {
        let env = ServerEnvelope {
            seq: 3,
            timestamp: 1200,
            payload: ServerPayload::Ack(Ack::failed(Some(9), ErrorCode::RoomFull)),
        };
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["payload"]["type"], "ack");
        assert_eq!(json["payload"]["data"]["requestId"], 9);
        assert_eq!(json["payload"]["data"]["success"], false);
        assert_eq!(json["payload"]["data"]["error"], "room_full");
        assert!(json["payload"]["data"].get("data").is_none());
    }

    #[test]
    fn test_game_started_ack_wire_format() {
        let ack = Ack::ok(
            Some(1),
            Some(AckData::GameStarted {
                word_index: 4,
                word_indices: Some(vec![4, 0, 2]),
            }),
        );
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["data"]["kind"], "game_started");
        assert_eq!(json["data"]["wordIndex"], 4);
        assert_eq!(json["data"]["wordIndices"][1], 0);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_room_expired_event_wire_format() {
        let event = RoomEvent::RoomExpired {
            room_code: RoomCode::parse("123456").unwrap(),
        };
        let json = serde_json::to_value(ServerPayload::Event(event)).unwrap();
        assert_eq!(json["type"], "event");
        assert_eq!(json["data"]["event"], "room_expired");
        assert_eq!(json["data"]["roomCode"], "123456");
    }

    #[test]
    fn test_error_code_display_matches_wire() {
        for code in [
            ErrorCode::RoomFull,
            ErrorCode::GameStarted,
            ErrorCode::RoomNotFound,
            ErrorCode::NotHost,
            ErrorCode::PlayersNotReady,
            ErrorCode::WordListUnavailable,
            ErrorCode::GameInProgress,
            ErrorCode::InvalidMessage,
        ] {
            let wire = serde_json::to_string(&code).unwrap();
            assert_eq!(wire, format!("\"{code}\""));
        }
    }
}
