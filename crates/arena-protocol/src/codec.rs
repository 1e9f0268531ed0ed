//! Codec trait and the JSON implementation.
//!
//! Browser clients read and write JSON text frames, so encoding produces a
//! `String`. Decoding takes raw bytes because a client may also send the
//! same JSON in a binary frame.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes events into text frames and decodes frames back into events.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a frame payload.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` for malformed input, unknown event
    /// names, or payloads of the wrong shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use arena_protocol::{ClientEvent, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let event: ClientEvent = codec
///     .decode(br#"{"event":"chat-message","data":{"message":"gg"}}"#)
///     .unwrap();
/// assert!(matches!(event, ClientEvent::ChatMessage(ref c) if c.message == "gg"));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
