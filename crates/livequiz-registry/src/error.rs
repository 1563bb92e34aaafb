//! Error types for the registry layer.

use std::path::PathBuf;

use livequiz_protocol::SessionCode;
use livequiz_session::IdentifierError;

/// Errors from creating or finding sessions.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No template is loaded under this name.
    #[error("unknown template {0:?}")]
    UnknownTemplate(String),

    /// No live session has this code.
    #[error("session {0} not found")]
    UnknownSession(SessionCode),

    /// Every probed session code was taken.
    #[error(transparent)]
    IdentifierSpaceExhausted(#[from] IdentifierError),
}

/// Errors from reading quiz templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template {0:?} not found")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
