//! Error types for action detection.

use medbridge_core::MedBridgeError;

use crate::types::MedActionType;

/// Errors from the rule engine.
///
/// A matcher failure is isolated to its own action type; the detector logs
/// it and keeps running the remaining matchers.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Pattern compilation failed: {0}")]
    Pattern(String),
    #[error("Matcher for {matcher} failed: {message}")]
    MatcherFailed {
        matcher: MedActionType,
        message: String,
    },
}

impl From<DetectionError> for MedBridgeError {
    fn from(err: DetectionError) -> Self {
        MedBridgeError::Detection(err.to_string())
    }
}
