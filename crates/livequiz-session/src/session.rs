//! The quiz progression state machine.
//!
//! A [`QuizSession`] owns its question list, its roster and its
//! broadcaster. All mutation happens under one per-session lock; every
//! operation that changes what viewers see drops the lock first and only
//! then publishes, so a slow broadcaster can't stall other players.

use std::collections::HashMap;
use std::sync::Arc;

use livequiz_broadcast::{Broadcaster, Listener};
use livequiz_protocol::{
    PlayerHandle, PlayerView, QuestionTemplate, QuestionView, QuizState, SessionCode,
    SessionEvent, SessionTemplate, SessionView,
};
use parking_lot::Mutex;

use crate::ids::generate_player_handle;
use crate::{Player, SessionError};

/// Shared handle to a live session.
pub type SessionRef = Arc<QuizSession>;

/// What a successful join (or resume) hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedPlayer {
    pub name: String,
    pub handle: PlayerHandle,
}

/// Result of [`QuizSession::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The session moved one step. `closed` is the question that was
    /// finalized, if one was open.
    Advanced {
        closed: Option<usize>,
        state: QuizState,
    },
    /// The session was already finished; nothing changed.
    AlreadyFinished,
}

impl AdvanceOutcome {
    /// The session state after the call.
    pub fn state(&self) -> QuizState {
        match self {
            Self::Advanced { state, .. } => *state,
            Self::AlreadyFinished => QuizState::Finished,
        }
    }
}

/// One running quiz.
pub struct QuizSession {
    code: SessionCode,
    template_name: String,
    default_timer_s: u32,
    questions: Arc<[QuestionTemplate]>,
    broadcaster: Broadcaster,
    inner: Mutex<SessionInner>,
}

struct SessionInner {
    state: QuizState,
    players: HashMap<String, Player>,
    /// handle -> name
    handles: HashMap<String, String>,
}

impl QuizSession {
    /// Instantiates a session from a template. The question list is
    /// copied, so later changes to the template never reach this session.
    pub fn from_template(
        code: SessionCode,
        template: &SessionTemplate,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            code,
            template_name: template.name.clone(),
            default_timer_s: template.global_timer_s,
            questions: template.questions.iter().cloned().collect(),
            broadcaster,
            inner: Mutex::new(SessionInner {
                state: QuizState::NotStarted,
                players: HashMap::new(),
                handles: HashMap::new(),
            }),
        }
    }

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn state(&self) -> QuizState {
        self.inner.lock().state
    }

    pub fn player_count(&self) -> usize {
        self.inner.lock().players.len()
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Subscribes to this session's events.
    pub fn subscribe(&self) -> Listener {
        self.broadcaster.subscribe()
    }

    /// Ends every listener. Used when the session is torn down.
    pub fn close(&self) {
        self.broadcaster.close();
    }

    /// Seconds allowed for the open question, or the session default when
    /// no question is open or the question doesn't set its own.
    pub fn current_timer(&self) -> u32 {
        match self.state().question() {
            Some(i) => self.questions[i].effective_timer(self.default_timer_s),
            None => self.default_timer_s,
        }
    }

    /// Adds a player under `name` and publishes `"roster"`.
    ///
    /// Allowed in any state. A player joining mid-quiz gets an empty slot
    /// for every question, including ones already closed.
    pub fn join(&self, name: &str) -> Result<JoinedPlayer, SessionError> {
        let joined = {
            let mut inner = self.inner.lock();
            if inner.players.contains_key(name) {
                return Err(SessionError::DuplicateName(name.to_string()));
            }

            let handle = generate_player_handle(name, |h| inner.handles.contains_key(h))?;
            let player = Player::new(name.to_string(), handle.clone(), self.questions.len());
            inner
                .handles
                .insert(handle.as_str().to_string(), name.to_string());
            inner.players.insert(name.to_string(), player);

            tracing::info!(
                code = %self.code,
                player = name,
                players = inner.players.len(),
                "player joined"
            );
            JoinedPlayer {
                name: name.to_string(),
                handle,
            }
        };

        self.broadcaster.publish(SessionEvent::RosterChanged.as_str());
        Ok(joined)
    }

    /// Looks a player up by the handle they were given on join.
    pub fn resume(&self, handle: &PlayerHandle) -> Option<JoinedPlayer> {
        let inner = self.inner.lock();
        let name = inner.handles.get(handle.as_str())?;
        Some(JoinedPlayer {
            name: name.clone(),
            handle: handle.clone(),
        })
    }

    /// Stakes `value` as `name`'s answer to the open question, replacing
    /// any earlier stake. Nothing is published; viewers learn the result
    /// on the next advance.
    pub fn submit_answer(&self, name: &str, value: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        let state = inner.state;
        let player = inner
            .players
            .get_mut(name)
            .ok_or_else(|| SessionError::UnknownPlayer(name.to_string()))?;
        if !state.is_active() {
            return Err(SessionError::SessionNotActive(state));
        }

        player.stake(value.to_string());
        tracing::debug!(code = %self.code, player = name, %state, "answer staked");
        Ok(())
    }

    /// Moves the quiz one step forward and publishes `"update"`.
    ///
    /// Closing question `i` finalizes slot `i` for every player, graded
    /// against that question's correct answer. Advancing a finished
    /// session changes nothing and publishes nothing.
    pub fn advance(&self) -> AdvanceOutcome {
        let outcome = {
            let mut inner = self.inner.lock();
            let Some(next) = inner.state.next(self.questions.len()) else {
                tracing::debug!(code = %self.code, "advance on finished session ignored");
                return AdvanceOutcome::AlreadyFinished;
            };

            let closed = inner.state.question();
            if let Some(i) = closed {
                let correct = &self.questions[i].correct_answer;
                for player in inner.players.values_mut() {
                    player.finalize(i, correct);
                }
            }
            inner.state = next;

            tracing::info!(
                code = %self.code,
                state = %next,
                players = inner.players.len(),
                "session advanced"
            );
            AdvanceOutcome::Advanced {
                closed,
                state: next,
            }
        };

        self.broadcaster.publish(SessionEvent::Updated.as_str());
        outcome
    }

    /// One player's public record.
    pub fn player(&self, name: &str) -> Option<PlayerView> {
        self.inner.lock().players.get(name).map(Player::view)
    }

    /// A full copy of the session for rendering. The open question's
    /// correct answer is never included.
    pub fn snapshot(&self) -> SessionView {
        let inner = self.inner.lock();

        let current_question = inner.state.question().map(|index| {
            let q = &self.questions[index];
            QuestionView {
                index,
                text: q.text.clone(),
                options: q.options.clone(),
                timer_s: q.effective_timer(self.default_timer_s),
            }
        });

        let mut players: Vec<PlayerView> = inner.players.values().map(Player::view).collect();
        players.sort_by(|a, b| a.name.cmp(&b.name));

        SessionView {
            code: self.code.clone(),
            template: self.template_name.clone(),
            state: inner.state,
            question_count: self.questions.len(),
            default_timer_s: self.default_timer_s,
            current_question,
            players,
        }
    }
}

impl std::fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizSession")
            .field("code", &self.code)
            .field("template", &self.template_name)
            .field("questions", &self.questions.len())
            .finish_non_exhaustive()
    }
}
