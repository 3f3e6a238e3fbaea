//! Normalization of protocol events into domain events.
//!
//! One normalizer exists per session and is driven single-threaded from
//! the session's ordered event channel, so no internal locking is needed
//! for the translation correlation slot.

use chrono::Utc;
use tracing::debug;

use medbridge_core::{DomainEvent, LanguagePair, Speaker, Utterance};

use crate::protocol::ServerEvent;

/// Turns the heterogeneous provider event stream into domain events.
///
/// Translation correlation uses a single "awaiting translation" slot with
/// last-writer-wins semantics, not a queue: a second utterance arriving
/// before the first is translated replaces the slot, so a late
/// translation attaches to the most recently created utterance. A
/// translation arriving with the slot empty is dropped.
pub struct EventNormalizer {
    languages: LanguagePair,
    sequence: u64,
    awaiting_translation: Option<Utterance>,
}

impl EventNormalizer {
    pub fn new(languages: LanguagePair) -> Self {
        Self {
            languages,
            sequence: 0,
            awaiting_translation: None,
        }
    }

    /// Process one protocol event, producing at most one domain event.
    pub fn handle(&mut self, event: ServerEvent) -> Option<DomainEvent> {
        match event {
            ServerEvent::TranscriptionCompleted { transcript } => {
                self.produce_utterance(transcript)
            }
            ServerEvent::ConversationItemCreated { role, transcript } => {
                if role == "user" {
                    transcript.and_then(|t| self.produce_utterance(t))
                } else {
                    None
                }
            }
            ServerEvent::TranscriptDelta { .. } => None,
            ServerEvent::TranscriptDone { transcript } => self.produce_translation(transcript),
            ServerEvent::ResponseDone { transcript } => {
                transcript.and_then(|t| self.produce_translation(t))
            }
            ServerEvent::SpeechStarted => Some(DomainEvent::SpeechStarted {
                timestamp: Utc::now(),
            }),
            ServerEvent::SpeechStopped => Some(DomainEvent::SpeechStopped {
                timestamp: Utc::now(),
            }),
            ServerEvent::Error { message } => Some(DomainEvent::ErrorOccurred {
                message,
                timestamp: Utc::now(),
            }),
        }
    }

    /// The utterance currently awaiting a translation, if any.
    pub fn pending_utterance(&self) -> Option<&Utterance> {
        self.awaiting_translation.as_ref()
    }

    /// Discard correlation state. Called on disconnect.
    pub fn reset(&mut self) {
        self.awaiting_translation = None;
    }

    fn produce_utterance(&mut self, transcript: String) -> Option<DomainEvent> {
        if transcript.trim().is_empty() {
            debug!("Empty transcript dropped");
            return None;
        }

        // Role disambiguation is unresolved upstream; every transcribed
        // human utterance is attributed to the clinician.
        let utterance = Utterance::new(
            Speaker::Clinician,
            transcript,
            self.languages.primary.clone(),
            self.sequence,
        );
        self.sequence += 1;

        // Last writer wins: an untranslated previous utterance is replaced.
        if let Some(previous) = self.awaiting_translation.replace(utterance.clone()) {
            debug!(
                utterance_id = %previous.id,
                "Untranslated utterance displaced from the correlation slot"
            );
        }

        Some(DomainEvent::UtteranceProduced {
            utterance,
            timestamp: Utc::now(),
        })
    }

    fn produce_translation(&mut self, text: String) -> Option<DomainEvent> {
        if text.trim().is_empty() {
            debug!("Empty translation dropped");
            return None;
        }

        match self.awaiting_translation.take() {
            Some(mut utterance) => {
                let translation = utterance
                    .attach_translation(text, self.languages.secondary.clone())
                    .clone();
                Some(DomainEvent::TranslationProduced {
                    translation,
                    timestamp: Utc::now(),
                })
            }
            None => {
                debug!("Translation arrived with no pending utterance; dropped");
                None
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
