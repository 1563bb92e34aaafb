//! Core protocol types: identifiers, quiz progression state, events.
//!
//! Everything in this module is small, cloneable, and serializable. The
//! session layer owns the behavior; these are just the nouns.

use serde::{Deserialize, Serialize};

use std::borrow::Borrow;
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The code players type to join a running quiz, e.g. `"7KQ2ZD"`.
///
/// A newtype over `String` so a code can't be passed where a player name or
/// handle is expected. Codes are fixed-length and drawn from `0-9A-Z`, but
/// the type doesn't enforce that. Codes arriving from clients are looked
/// up as-is and simply miss if malformed.
///
/// `#[serde(transparent)]` makes the code serialize as a bare JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

// Lets maps keyed by `SessionCode` be probed with a plain `&str`. Sound
// because the derived `Hash`/`Eq` forward to the inner `String`.
impl Borrow<str> for SessionCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl From<&str> for SessionCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A per-player identifier handed out on join, e.g. `"a8ZkQ01xYt"`.
///
/// Display names identify players inside a session; the handle lets a
/// reconnecting client claim its name again without retyping it. Handles
/// are not secrets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerHandle(String);

impl PlayerHandle {
    /// Returns the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PlayerHandle {
    fn from(handle: String) -> Self {
        Self(handle)
    }
}

impl From<&str> for PlayerHandle {
    fn from(handle: &str) -> Self {
        Self(handle.to_string())
    }
}

impl fmt::Display for PlayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// QuizState
// ---------------------------------------------------------------------------

/// Where a session is in its question sequence.
///
/// Transitions are strictly ordered, one step per advance:
///
/// ```text
/// NotStarted → InProgress(0) → InProgress(1) → … → InProgress(len-1) → Finished
/// ```
///
/// `Finished` is terminal. A quiz with no questions goes straight from
/// `NotStarted` to `Finished`.
///
/// On the wire this is adjacently tagged:
/// `{"phase":"InProgress","question":2}`, `{"phase":"Finished"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "question")]
pub enum QuizState {
    NotStarted,
    InProgress(usize),
    Finished,
}

impl QuizState {
    /// Returns `true` while a question is open for answers.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress(_))
    }

    /// Returns `true` once every question has been closed.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// The open question's index, if any.
    pub fn question(&self) -> Option<usize> {
        match self {
            Self::InProgress(i) => Some(*i),
            _ => None,
        }
    }

    /// The integer question index in `[-1, question_count]`.
    ///
    /// `-1` means not started, `question_count` means finished.
    pub fn index(&self, question_count: usize) -> i64 {
        match self {
            Self::NotStarted => -1,
            Self::InProgress(i) => *i as i64,
            Self::Finished => question_count as i64,
        }
    }

    /// The state one advance later, or `None` if already finished.
    pub fn next(self, question_count: usize) -> Option<Self> {
        let following = |i: usize| {
            if i < question_count {
                Self::InProgress(i)
            } else {
                Self::Finished
            }
        };
        match self {
            Self::NotStarted => Some(following(0)),
            Self::InProgress(i) => Some(following(i + 1)),
            Self::Finished => None,
        }
    }
}

impl fmt::Display for QuizState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NotStarted"),
            Self::InProgress(i) => write!(f, "InProgress({i})"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// The notifications a session publishes to its listeners.
///
/// Listeners receive only the short string from [`SessionEvent::as_str`];
/// clients react by fetching a fresh [`SessionView`](crate::SessionView)
/// rather than by applying deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A player joined.
    RosterChanged,
    /// The host advanced the quiz.
    Updated,
}

impl SessionEvent {
    /// The event string delivered to listeners.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RosterChanged => "roster",
            Self::Updated => "update",
        }
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Answer
// ---------------------------------------------------------------------------

/// A finalized answer for one question.
///
/// Written once, when the session advances past that question. An empty
/// `value` means the player never answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub value: String,
    pub correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_session_code_serializes_as_plain_string() {
        let json = serde_json::to_string(&SessionCode::from("AB12CD")).unwrap();
        assert_eq!(json, "\"AB12CD\"");
    }

    #[test]
    fn test_player_handle_display_is_raw_handle() {
        assert_eq!(PlayerHandle::from("a8ZkQ01xYt").to_string(), "a8ZkQ01xYt");
    }

    // =====================================================================
    // QuizState
    // =====================================================================

    #[test]
    fn test_quiz_state_next_walks_every_question_then_finishes() {
        let mut state = QuizState::NotStarted;
        let mut seen = vec![state];
        while let Some(next) = state.next(3) {
            state = next;
            seen.push(state);
        }

        assert_eq!(
            seen,
            vec![
                QuizState::NotStarted,
                QuizState::InProgress(0),
                QuizState::InProgress(1),
                QuizState::InProgress(2),
                QuizState::Finished,
            ]
        );
    }

    #[test]
    fn test_quiz_state_next_without_questions_finishes_immediately() {
        assert_eq!(QuizState::NotStarted.next(0), Some(QuizState::Finished));
    }

    #[test]
    fn test_quiz_state_index_covers_sentinels() {
        assert_eq!(QuizState::NotStarted.index(4), -1);
        assert_eq!(QuizState::InProgress(2).index(4), 2);
        assert_eq!(QuizState::Finished.index(4), 4);
    }

    #[test]
    fn test_quiz_state_is_active_only_in_progress() {
        assert!(!QuizState::NotStarted.is_active());
        assert!(QuizState::InProgress(0).is_active());
        assert!(!QuizState::Finished.is_active());
    }

    #[test]
    fn test_quiz_state_json_format() {
        let json = serde_json::to_value(QuizState::InProgress(2)).unwrap();
        assert_eq!(json["phase"], "InProgress");
        assert_eq!(json["question"], 2);

        let json = serde_json::to_value(QuizState::Finished).unwrap();
        assert_eq!(json["phase"], "Finished");
    }

    #[test]
    fn test_session_event_strings() {
        assert_eq!(SessionEvent::RosterChanged.as_str(), "roster");
        assert_eq!(SessionEvent::Updated.to_string(), "update");
    }
}
