//! Inbound realtime protocol event parsing.
//!
//! The provider delivers JSON text frames tagged by a string `type`
//! field. Recognized tags map to `ServerEvent` variants; unknown tags are
//! ignored for forward compatibility. Malformed frames are an error the
//! caller logs and drops without affecting the session.

use serde_json::Value;

use crate::error::SessionError;

const DEFAULT_ERROR_MESSAGE: &str = "Unknown provider error";

/// A recognized inbound protocol event.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// The user's speech segment was transcribed.
    TranscriptionCompleted { transcript: String },
    /// A conversation item was created; user items may carry a transcript.
    ConversationItemCreated {
        role: String,
        transcript: Option<String>,
    },
    /// Incremental assistant transcript text. Informational only.
    TranscriptDelta { delta: String },
    /// The assistant's transcript for the current response is final.
    TranscriptDone { transcript: String },
    /// The full response completed; may carry the final transcript.
    ResponseDone { transcript: Option<String> },
    /// Speech activity started on the input buffer.
    SpeechStarted,
    /// Speech activity stopped on the input buffer.
    SpeechStopped,
    /// Provider-level error.
    Error { message: String },
}

impl ServerEvent {
    /// Parse one raw frame.
    ///
    /// Returns `Ok(None)` for unrecognized event types and `Err` for
    /// frames that are not JSON objects with a string `type` tag.
    pub fn parse(raw: &str) -> Result<Option<ServerEvent>, SessionError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| SessionError::Protocol(format!("invalid JSON frame: {}", e)))?;
        let event_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| SessionError::Protocol("frame has no type tag".to_string()))?;

        let event = match event_type {
            "input_audio_transcription.completed" => Some(ServerEvent::TranscriptionCompleted {
                transcript: string_at(&value, &["transcript"]).unwrap_or_default(),
            }),
            "conversation.item.created" => Some(ServerEvent::ConversationItemCreated {
                role: string_at(&value, &["item", "role"]).unwrap_or_default(),
                transcript: item_transcript(&value),
            }),
            "response.audio_transcript.delta" => Some(ServerEvent::TranscriptDelta {
                delta: string_at(&value, &["delta"]).unwrap_or_default(),
            }),
            "response.audio_transcript.done" => Some(ServerEvent::TranscriptDone {
                transcript: string_at(&value, &["transcript"]).unwrap_or_default(),
            }),
            "response.done" => Some(ServerEvent::ResponseDone {
                transcript: response_transcript(&value),
            }),
            "input_audio_buffer.speech_started" => Some(ServerEvent::SpeechStarted),
            "input_audio_buffer.speech_stopped" => Some(ServerEvent::SpeechStopped),
            "error" => Some(ServerEvent::Error {
                message: string_at(&value, &["error", "message"])
                    .or_else(|| string_at(&value, &["message"]))
                    .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
            }),
            _ => None,
        };
        Ok(event)
    }
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str().map(str::to_string)
}

/// Transcript of a conversation item: the first content entry that
/// carries one.
fn item_transcript(value: &Value) -> Option<String> {
    value
        .get("item")?
        .get("content")?
        .as_array()?
        .iter()
        .find_map(|entry| entry.get("transcript").and_then(Value::as_str))
        .map(str::to_string)
}

/// Transcript nested in a completed response:
/// `response.output[0].content[*].transcript`.
fn response_transcript(value: &Value) -> Option<String> {
    value
        .get("response")?
        .get("output")?
        .as_array()?
        .first()?
        .get("content")?
        .as_array()?
        .iter()
        .find_map(|entry| entry.get("transcript").and_then(Value::as_str))
        .map(str::to_string)
}

// =============================================================================
// Tests
// =============================================================================
