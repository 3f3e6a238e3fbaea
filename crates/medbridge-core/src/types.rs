use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// The role of the person an utterance is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Clinician,
    Patient,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Clinician => write!(f, "clinician"),
            Speaker::Patient => write!(f, "patient"),
        }
    }
}

impl std::str::FromStr for Speaker {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clinician" => Ok(Speaker::Clinician),
            "patient" => Ok(Speaker::Patient),
            _ => Err(format!("Unknown speaker role: {}", s)),
        }
    }
}

/// Lifecycle status of an interpretation session connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No connection established. Ready to connect.
    Idle,
    /// Token fetch and transport negotiation in progress.
    Connecting,
    /// Transport established, events flowing.
    Connected,
    /// A connection-level failure occurred.
    Error,
    /// Session torn down by the caller.
    Disconnected,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Connecting => write!(f, "connecting"),
            SessionStatus::Connected => write!(f, "connected"),
            SessionStatus::Error => write!(f, "error"),
            SessionStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(SessionStatus::Idle),
            "connecting" => Ok(SessionStatus::Connecting),
            "connected" => Ok(SessionStatus::Connected),
            "error" => Ok(SessionStatus::Error),
            "disconnected" => Ok(SessionStatus::Disconnected),
            _ => Err(format!("Unknown session status: {}", s)),
        }
    }
}

// =============================================================================
// Domain Structs
// =============================================================================

/// The two languages spoken in a session.
///
/// `primary` is the clinician's language; `secondary` is the patient's.
/// Utterances carry the primary language, translations the secondary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    pub primary: String,
    pub secondary: String,
}

impl LanguagePair {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self::new("en", "es")
    }
}

/// One completed speech segment attributed to a single speaker.
///
/// Immutable once created, except for attaching at most one translation.
/// `sequence` increases monotonically within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub id: Uuid,
    pub speaker: Speaker,
    pub text: String,
    pub language: String,
    pub timestamp: DateTime<Utc>,
    pub sequence: u64,
    pub translation: Option<Translation>,
}

impl Utterance {
    /// Create a new untranslated utterance.
    pub fn new(speaker: Speaker, text: String, language: String, sequence: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker,
            text,
            language,
            timestamp: Utc::now(),
            sequence,
            translation: None,
        }
    }

    /// Attach a translation to this utterance. At most one is kept.
    pub fn attach_translation(&mut self, text: String, language: String) -> &Translation {
        self.translation = Some(Translation {
            text,
            language,
            utterance_id: self.id,
            timestamp: Utc::now(),
        });
        self.translation.as_ref().expect("translation just attached")
    }
}

/// The target-language rendering of an utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub text: String,
    pub language: String,
    pub utterance_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Tests
// =============================================================================
