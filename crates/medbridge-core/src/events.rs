use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SessionStatus, Translation, Utterance};

/// All domain events emitted by an interpretation session.
///
/// Events are produced by the session event pump after normalization and
/// consumed by:
/// - UI subscribers (status indicators, live transcript rendering)
/// - The caller feeding clinician utterances to the action detector
/// - Cross-cutting listeners (logging, metrics)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DomainEvent {
    /// The session connection status changed.
    StatusChanged {
        status: SessionStatus,
        timestamp: DateTime<Utc>,
    },

    /// A completed speech segment was transcribed.
    UtteranceProduced {
        utterance: Utterance,
        timestamp: DateTime<Utc>,
    },

    /// The interpreter produced a target-language rendering.
    TranslationProduced {
        translation: Translation,
        timestamp: DateTime<Utc>,
    },

    /// Speech activity started on the input audio.
    SpeechStarted { timestamp: DateTime<Utc> },

    /// Speech activity stopped on the input audio.
    SpeechStopped { timestamp: DateTime<Utc> },

    /// A connection- or protocol-level error surfaced from the provider.
    ErrorOccurred {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::StatusChanged { timestamp, .. }
            | DomainEvent::UtteranceProduced { timestamp, .. }
            | DomainEvent::TranslationProduced { timestamp, .. }
            | DomainEvent::SpeechStarted { timestamp }
            | DomainEvent::SpeechStopped { timestamp }
            | DomainEvent::ErrorOccurred { timestamp, .. } => *timestamp,
        }
    }

    /// Returns a stable event name for logging and subscribers.
    pub fn event_name(&self) -> &'static str {
        match self {
            DomainEvent::StatusChanged { .. } => "status_changed",
            DomainEvent::UtteranceProduced { .. } => "utterance_produced",
            DomainEvent::TranslationProduced { .. } => "translation_produced",
            DomainEvent::SpeechStarted { .. } => "speech_started",
            DomainEvent::SpeechStopped { .. } => "speech_stopped",
            DomainEvent::ErrorOccurred { .. } => "error_occurred",
        }
    }
}
