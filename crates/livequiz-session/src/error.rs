//! Error types for the session layer.

use livequiz_protocol::QuizState;

use crate::IdentifierError;

/// Errors returned by operations on a single session.
///
/// None of these are fatal: the session stays consistent and every other
/// session is untouched. The caller decides what the player sees.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Another player in this session already uses the name.
    #[error("player name {0:?} is already taken in this session")]
    DuplicateName(String),

    /// No player with this name has joined the session.
    #[error("unknown player {0:?}")]
    UnknownPlayer(String),

    /// Answers are only accepted while a question is open.
    #[error("session is not accepting answers (state: {0})")]
    SessionNotActive(QuizState),

    /// No free player handle could be found.
    #[error(transparent)]
    IdentifierSpaceExhausted(#[from] IdentifierError),
}
