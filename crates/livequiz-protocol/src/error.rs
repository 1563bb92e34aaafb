//! Error types for the protocol layer.
//!
//! Each crate in Livequiz defines its own error enum. A `ProtocolError`
//! always means a frame could not be turned into a message (or back),
//! never that a quiz operation was rejected.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into a text frame).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning a text frame into a Rust value).
    ///
    /// Common causes: malformed JSON, an unknown `type` tag, missing
    /// required fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but breaks a protocol rule, e.g. an `Answer`
    /// sent before the connection joined a session.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
