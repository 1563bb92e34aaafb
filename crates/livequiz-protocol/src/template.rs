//! Quiz templates: the immutable definitions sessions are built from.
//!
//! Field names match the template files on disk:
//!
//! ```json
//! {
//!   "name": "geo-quiz",
//!   "global_timer_s": 20,
//!   "questions": [
//!     { "text": "Capital of France?", "timer_s": 10,
//!       "correct_answer": "Paris", "options": ["Paris", "Lyon"] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// One question of a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTemplate {
    /// The prompt shown to players.
    pub text: String,

    /// Seconds allowed for this question. 0 (or absent) means "use the
    /// session default".
    #[serde(default)]
    pub timer_s: u32,

    /// Compared by exact string equality against submitted answers.
    pub correct_answer: String,

    /// Selectable options, in display order.
    #[serde(default)]
    pub options: Vec<String>,
}

impl QuestionTemplate {
    /// The timer for this question, falling back to `default_s` when the
    /// question doesn't set its own.
    pub fn effective_timer(&self, default_s: u32) -> u32 {
        if self.timer_s == 0 {
            default_s
        } else {
            self.timer_s
        }
    }
}

/// A complete quiz definition.
///
/// Loaded once, shared behind an `Arc`, never mutated. Any number of
/// sessions may be instantiated from the same template at once; each one
/// copies the question list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTemplate {
    #[serde(default)]
    pub name: String,

    /// Default per-question timer in seconds.
    #[serde(default)]
    pub global_timer_s: u32,

    pub questions: Vec<QuestionTemplate>,
}

impl SessionTemplate {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}
