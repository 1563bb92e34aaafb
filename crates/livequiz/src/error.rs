//! Unified error type for Livequiz.

use livequiz_protocol::ProtocolError;
use livequiz_registry::{RegistryError, TemplateError};
use livequiz_session::SessionError;
use livequiz_transport::TransportError;

use crate::config::ConfigError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LiveQuizError {
    /// Connection-level failure (accept, send, receive).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be decoded, or broke a protocol rule.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A quiz operation was rejected by the session.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A session or template could not be found or created.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A template could not be read.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Bad configuration value.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The global tracing subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl LiveQuizError {
    /// The stable numeric code sent to clients in `Error` frames.
    ///
    /// HTTP-flavored: 400 for malformed requests, 404 for anything that
    /// wasn't found, 409 for requests that conflict with the session's
    /// current state, 503 when no identifier could be allocated.
    pub fn code(&self) -> u16 {
        match self {
            Self::Protocol(_) => 400,
            Self::Session(e) => match e {
                SessionError::DuplicateName(_) => 409,
                SessionError::UnknownPlayer(_) => 404,
                SessionError::SessionNotActive(_) => 409,
                SessionError::IdentifierSpaceExhausted(_) => 503,
            },
            Self::Registry(e) => match e {
                RegistryError::UnknownTemplate(_) | RegistryError::UnknownSession(_) => 404,
                RegistryError::IdentifierSpaceExhausted(_) => 503,
            },
            Self::Template(TemplateError::NotFound(_)) => 404,
            Self::Config(_) => 400,
            Self::Transport(_) | Self::Template(_) | Self::Logging(_) => 500,
        }
    }
}
