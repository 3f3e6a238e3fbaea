//! Rule-based medical action detection for MedBridge.
//!
//! Extracts structured clinical actions (prescriptions, lab orders,
//! referrals, follow-ups, diagnostic tests) with confidence scores from
//! clinician utterances, using a static medical term index and compiled
//! regex pattern sets.

pub mod detector;
pub mod error;
pub mod patterns;
pub mod terms;
pub mod types;

pub use detector::ActionDetector;
pub use error::DetectionError;
pub use terms::{MedicalTerm, MedicalTermIndex, TermCodes, TermMatch};
pub use types::{
    ActionDetails, DetectedAction, DetectionContext, MedActionType, TermCategory, Urgency,
};
