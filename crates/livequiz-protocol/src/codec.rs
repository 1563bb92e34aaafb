//! Codec trait and implementations for text frames.
//!
//! Live connections carry text frames, so a codec turns a value into a
//! `String` and a `&str` back into a value. The rest of the workspace
//! only sees the [`Codec`] trait; [`JsonCodec`] is the one shipped
//! implementation.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust values to text and decode text back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a text frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed or does
    /// not match the expected type.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Browsers speak JSON natively, which keeps quiz clients trivial. This is
/// behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use livequiz_protocol::{ClientMessage, Codec, Envelope, JsonCodec, SessionCode};
///
/// let codec = JsonCodec;
/// let envelope = Envelope::new(1, 0, ClientMessage::Advance {
///     code: SessionCode::from("AB12CD"),
/// });
///
/// let text = codec.encode(&envelope).unwrap();
/// let decoded: Envelope<ClientMessage> = codec.decode(&text).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientMessage, Envelope, ServerMessage};

    #[test]
    fn test_decode_client_frame_from_browser_json() {
        let text = r#"{"seq":3,"timestamp":0,"payload":{"type":"Join","code":"QZ1234","name":"bob"}}"#;

        let envelope: Envelope<ClientMessage> = JsonCodec.decode(text).unwrap();

        assert_eq!(envelope.seq, 3);
        match envelope.payload {
            ClientMessage::Join { code, name } => {
                assert_eq!(code.as_str(), "QZ1234");
                assert_eq!(name, "bob");
            }
            other => panic!("expected Join, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_server_error_is_plain_text_json() {
        let envelope = Envelope::new(
            7,
            120,
            ServerMessage::Error {
                code: 404,
                message: "unknown session".into(),
            },
        );

        let text = JsonCodec.encode(&envelope).unwrap();

        assert!(text.contains(r#""type":"Error""#));
        assert!(text.contains(r#""code":404"#));
    }

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let result: Result<Envelope<ClientMessage>, _> = JsonCodec.decode("not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
