//! A player's record inside one session.

use livequiz_protocol::{Answer, PlayerHandle, PlayerView};

/// Grades a submitted value against the question's correct answer.
///
/// Exact string equality; an empty value is never correct, even against
/// an empty correct answer.
pub fn grade(value: &str, correct_answer: &str) -> bool {
    !value.is_empty() && value == correct_answer
}

/// One participant in a session.
///
/// `current_answer` is written only by `submit_answer` and read-and-cleared
/// only by `advance`. Each slot in `answers` is written exactly once, when
/// the session moves past that question.
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    handle: PlayerHandle,
    current_answer: String,
    answers: Vec<Option<Answer>>,
}

impl Player {
    pub(crate) fn new(name: String, handle: PlayerHandle, question_count: usize) -> Self {
        Self {
            name,
            handle,
            current_answer: String::new(),
            answers: vec![None; question_count],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> &PlayerHandle {
        &self.handle
    }

    /// The answer staked for the open question, empty if none.
    pub fn current_answer(&self) -> &str {
        &self.current_answer
    }

    /// One slot per question, `None` until that question closes.
    pub fn answers(&self) -> &[Option<Answer>] {
        &self.answers
    }

    /// Whether an answer is staked for the open question.
    pub fn has_answered(&self) -> bool {
        !self.current_answer.is_empty()
    }

    /// Number of finalized answers that were correct.
    pub fn score(&self) -> usize {
        self.answers
            .iter()
            .filter(|slot| matches!(slot, Some(Answer { correct: true, .. })))
            .count()
    }

    pub(crate) fn stake(&mut self, value: String) {
        self.current_answer = value;
    }

    /// Closes question `index`: grades the staked answer, writes the slot
    /// and clears the stake.
    pub(crate) fn finalize(&mut self, index: usize, correct_answer: &str) {
        let value = std::mem::take(&mut self.current_answer);
        let correct = grade(&value, correct_answer);
        if let Some(slot) = self.answers.get_mut(index) {
            debug_assert!(slot.is_none(), "answer slot {index} written twice");
            *slot = Some(Answer { value, correct });
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            name: self.name.clone(),
            has_answered: self.has_answered(),
            answers: self.answers.clone(),
            score: self.score(),
        }
    }
}
