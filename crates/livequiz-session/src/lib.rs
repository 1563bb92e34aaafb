//! Live quiz sessions for Livequiz.
//!
//! This crate is the heart of the engine:
//!
//! 1. **Identifiers**: session codes and player handles that don't
//!    collide with ones already in use ([`generate_session_code`],
//!    [`generate_player_handle`]).
//! 2. **Progression**: the per-session state machine that tracks the
//!    open question, captures each player's staked answer, and scores it
//!    when the host advances ([`QuizSession`]).
//!
//! # How it fits in the stack
//!
//! ```text
//! Registry (above)   ← creates sessions, looks them up by code
//!     ↕
//! Session (this crate) ← join / submit_answer / advance, then publish
//!     ↕
//! Broadcast + Protocol (below) ← fan-out, shared types
//! ```

mod error;
pub mod ids;
mod player;
mod session;

pub use error::SessionError;
pub use ids::{IdentifierError, generate_player_handle, generate_session_code};
pub use livequiz_protocol::{Answer, QuizState};
pub use player::{Player, grade};
pub use session::{AdvanceOutcome, JoinedPlayer, QuizSession, SessionRef};
