//! Full-state snapshots of a session.
//!
//! Clients don't receive answer-level deltas. When a listener sees an
//! event it asks for a [`SessionView`] and re-renders everything, so the
//! view has to carry all of it: progress, the open question, and every
//! player's record.

use serde::{Deserialize, Serialize};

use crate::{Answer, QuizState, SessionCode};

/// A point-in-time copy of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub code: SessionCode,
    /// Name of the template the session was created from.
    pub template: String,
    pub state: QuizState,
    pub question_count: usize,
    pub default_timer_s: u32,
    /// The open question, present only while `state` is `InProgress`.
    pub current_question: Option<QuestionView>,
    /// Every player, sorted by name.
    pub players: Vec<PlayerView>,
}

/// The open question as players see it.
///
/// The correct answer is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub index: usize,
    pub text: String,
    pub options: Vec<String>,
    /// Effective timer: the question's own, or the session default.
    pub timer_s: u32,
}

/// One player's public record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    /// Whether an answer is staked for the open question.
    pub has_answered: bool,
    /// One slot per question; `None` until that question closes.
    pub answers: Vec<Option<Answer>>,
    /// Count of correct finalized answers.
    pub score: usize,
}
