//! Messages exchanged over a live connection.
//!
//! Both directions use internally tagged JSON, e.g.
//! `{ "type": "Join", "code": "AB12CD", "name": "bob" }`, wrapped in an
//! [`Envelope`] that carries ordering metadata.

use serde::{Deserialize, Serialize};

use crate::{PlayerHandle, QuizState, SessionCode, SessionView};

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// Client → server requests.
///
/// Host actions (`Create`, `Advance`) name the session directly. Player
/// actions after `Join`/`Resume` use the identity the connection already
/// holds, so `Answer` carries only the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// "Which quizzes can I start?"
    ListTemplates,

    /// Host: "Start a new session from this template."
    Create { template: String },

    /// Player: "Add me to this session under this name."
    Join { code: SessionCode, name: String },

    /// Player: "I'm back; here's the handle you gave me."
    Resume {
        code: SessionCode,
        handle: PlayerHandle,
    },

    /// Player: "Stake this answer for the open question."
    Answer { value: String },

    /// Host: "Close the open question and move on."
    Advance { code: SessionCode },

    /// "Push this session's events to me."
    Watch { code: SessionCode },

    /// "Stop pushing events."
    Unwatch,

    /// "Send me the full current state."
    Snapshot { code: SessionCode },

    /// "I'm leaving."
    Disconnect { reason: String },
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Server → client responses and pushed events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    TemplateList { templates: Vec<String> },

    Created { code: SessionCode },

    /// Sent on `Join` and `Resume`. Keep the handle to resume later.
    Joined {
        code: SessionCode,
        name: String,
        handle: PlayerHandle,
    },

    AnswerAccepted,

    Advanced {
        code: SessionCode,
        state: QuizState,
    },

    Watching { code: SessionCode },

    /// Reply to `Unwatch`. `code` is the session that was being watched,
    /// if any.
    Unwatched { code: Option<SessionCode> },

    /// A pushed notification from a watched session (`"roster"`,
    /// `"update"`). Fetch a `Snapshot` to see what changed.
    Event { code: SessionCode, event: String },

    Snapshot { session: SessionView },

    /// `code` is stable per condition (HTTP-style: 400, 404, 409, 503).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The top-level frame. Every text frame on the wire is one envelope.
///
/// Each side numbers its own frames with `seq`; `timestamp` is
/// milliseconds since the sender's connection started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<P> {
    pub seq: u64,
    #[serde(default)]
    pub timestamp: u64,
    pub payload: P,
}

impl<P> Envelope<P> {
    pub fn new(seq: u64, timestamp: u64, payload: P) -> Self {
        Self {
            seq,
            timestamp,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_join_json_format() {
        let msg = ClientMessage::Join {
            code: SessionCode::from("AB12CD"),
            name: "alice".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "Join");
        assert_eq!(json["code"], "AB12CD");
        assert_eq!(json["name"], "alice");
    }

    #[test]
    fn test_client_message_unit_variant_json_format() {
        let json = serde_json::to_value(ClientMessage::ListTemplates).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "ListTemplates" }));
    }

    #[test]
    fn test_server_message_advanced_carries_state() {
        let msg = ServerMessage::Advanced {
            code: SessionCode::from("AB12CD"),
            state: QuizState::InProgress(1),
        };
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "Advanced");
        assert_eq!(json["state"]["phase"], "InProgress");
        assert_eq!(json["state"]["question"], 1);
    }

    #[test]
    fn test_server_message_unwatched_without_watch_is_null_code() {
        let json = serde_json::to_value(ServerMessage::Unwatched { code: None }).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "Unwatched", "code": null }));
    }

    #[test]
    fn test_envelope_timestamp_defaults_when_missing() {
        let json = r#"{ "seq": 1, "payload": { "type": "Unwatch" } }"#;
        let envelope: Envelope<ClientMessage> = serde_json::from_str(json).unwrap();

        assert_eq!(envelope.timestamp, 0);
        assert_eq!(envelope.payload, ClientMessage::Unwatch);
    }

    #[test]
    fn test_decode_unknown_message_type_returns_error() {
        let unknown = r#"{"type": "SkipToEnd"}"#;
        let result: Result<ClientMessage, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
