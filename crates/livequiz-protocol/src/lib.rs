//! Wire protocol for Livequiz.
//!
//! This crate defines the vocabulary shared by every other layer:
//!
//! - **Identity types** ([`SessionCode`], [`PlayerHandle`]): the short
//!   strings that name a running quiz and a player inside it.
//! - **Templates** ([`SessionTemplate`], [`QuestionTemplate`]): the
//!   immutable quiz definitions sessions are instantiated from.
//! - **State** ([`QuizState`], [`SessionEvent`], [`Answer`]): the
//!   progression state machine's states and the events it emits.
//! - **Views** ([`SessionView`] and friends): full-state snapshots that
//!   clients re-render on every update signal.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`], [`Envelope`]):
//!   what travels over a live connection.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become
//!   text frames and back.
//!
//! # Architecture
//!
//! ```text
//! Transport (text frames) → Protocol (Envelope) → Session / Registry
//! ```
//!
//! Nothing here knows about locks, connections, or listeners. Only data.

mod codec;
mod error;
mod message;
mod template;
mod types;
mod view;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{ClientMessage, Envelope, ServerMessage};
pub use template::{QuestionTemplate, SessionTemplate};
pub use types::{Answer, PlayerHandle, QuizState, SessionCode, SessionEvent};
pub use view::{PlayerView, QuestionView, SessionView};
