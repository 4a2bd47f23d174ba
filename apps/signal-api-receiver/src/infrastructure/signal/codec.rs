//! Frame Codec
//!
//! Decodes WebSocket frames from the signal-cli REST API into [`Message`]s.
//! Each frame carries exactly one JSON object; frames that are not valid
//! JSON or do not match the message schema are rejected.

use crate::domain::message::Message;

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame was empty or whitespace only.
    #[error("empty frame")]
    EmptyFrame,
}

/// JSON codec for signal-cli envelopes.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode one frame into a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is empty, not JSON, or does not match
    /// the message schema.
    pub fn decode(&self, frame: &[u8]) -> Result<Message, CodecError> {
        if frame.trim_ascii().is_empty() {
            return Err(CodecError::EmptyFrame);
        }
        Ok(serde_json::from_slice(frame)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_text_message() {
        let codec = JsonCodec::new();
        let msg = codec
            .decode(br#"{"envelope":{"dataMessage":{"message":"hi"}},"account":"+1"}"#)
            .unwrap();
        assert_eq!(msg.account, "+1");
        assert_eq!(msg.body(), Some("hi"));
    }

    #[test]
    fn decode_tolerates_surrounding_whitespace() {
        let codec = JsonCodec::new();
        let msg = codec.decode(b"  {\"account\":\"7\"}\n").unwrap();
        assert_eq!(msg.account, "7");
    }

    #[test]
    fn decode_rejects_empty_frame() {
        let codec = JsonCodec::new();
        assert!(matches!(codec.decode(b""), Err(CodecError::EmptyFrame)));
        assert!(matches!(codec.decode(b" \n"), Err(CodecError::EmptyFrame)));
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let codec = JsonCodec::new();
        assert!(matches!(codec.decode(b"not json"), Err(CodecError::Json(_))));
        assert!(matches!(codec.decode(b"{\"account\":"), Err(CodecError::Json(_))));
    }

    #[test]
    fn decode_rejects_schema_mismatch() {
        let codec = JsonCodec::new();
        assert!(codec.decode(br#"{"account":5}"#).is_err());
        assert!(codec.decode(br#"{"envelope":"nope"}"#).is_err());
        assert!(codec.decode(br#"{"envelope":{"dataMessage":{"message":3}}}"#).is_err());
        assert!(codec.decode(b"[1,2,3]").is_err());
    }
}
