//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The rest of the stack doesn't care HOW frames are serialized — it just
//! needs something that implements the [`Codec`] trait, so a binary codec
//! can be swapped in later without touching the channel layer.
//!
//! Currently we provide [`JsonCodec`], matching the server's JSON frames.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the channel layer stores the codec
/// inside long-lived async tasks that Tokio may run on any thread.
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the result doesn't
/// borrow from the input bytes — the frame buffer can be dropped right
/// after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is what the game server speaks. Behind the `json` feature flag
/// (enabled by default) so integrators swapping in a different codec can
/// drop the serde_json dependency.
///
/// ## Example
///
/// ```rust
/// use dungeonlink_protocol::{Codec, JsonCodec, ServerEvent, PlayerId};
///
/// let codec = JsonCodec;
///
/// let frame = br#"{"type": "GAME_OVER", "winnerId": 2}"#;
/// let event: ServerEvent = codec.decode(frame).unwrap();
/// assert_eq!(event, ServerEvent::GameOver { winner_id: PlayerId(2) });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientMessage, RoomId, ServerEvent};

    #[test]
    fn test_json_codec_encodes_client_message() {
        let codec = JsonCodec;
        let msg = ClientMessage::JoinRoom {
            room_id: RoomId::new("R1"),
        };
        let bytes = codec.encode(&msg).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("\"JOIN_ROOM\""));
        assert!(text.contains("\"roomId\""));
    }

    #[test]
    fn test_json_codec_decode_garbage_returns_error() {
        let codec = JsonCodec;
        let result: Result<ServerEvent, _> = codec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
