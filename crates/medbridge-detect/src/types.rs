//! Core types and value objects for action detection.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::terms::TermMatch;

// =============================================================================
// Enums
// =============================================================================

/// The clinical action types the rule engine can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedActionType {
    Prescription,
    LabOrder,
    Referral,
    FollowUp,
    DiagnosticTest,
}

impl fmt::Display for MedActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MedActionType::Prescription => write!(f, "prescription"),
            MedActionType::LabOrder => write!(f, "lab_order"),
            MedActionType::Referral => write!(f, "referral"),
            MedActionType::FollowUp => write!(f, "follow_up"),
            MedActionType::DiagnosticTest => write!(f, "diagnostic_test"),
        }
    }
}

impl std::str::FromStr for MedActionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prescription" => Ok(MedActionType::Prescription),
            "lab_order" => Ok(MedActionType::LabOrder),
            "referral" => Ok(MedActionType::Referral),
            "follow_up" => Ok(MedActionType::FollowUp),
            "diagnostic_test" => Ok(MedActionType::DiagnosticTest),
            _ => Err(format!("Unknown action type: {}", s)),
        }
    }
}

/// How soon an ordered test or referral should happen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Routine,
    Urgent,
    Stat,
    Emergent,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Routine => write!(f, "routine"),
            Urgency::Urgent => write!(f, "urgent"),
            Urgency::Stat => write!(f, "stat"),
            Urgency::Emergent => write!(f, "emergent"),
        }
    }
}

impl Urgency {
    /// Escalate from urgency keywords in the utterance; defaults to routine.
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        let has_word = |w: &str| {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|tok| tok == w)
        };
        if has_word("stat") {
            Urgency::Stat
        } else if has_word("emergent") || has_word("emergency") {
            Urgency::Emergent
        } else if has_word("urgent")
            || has_word("urgently")
            || has_word("immediately")
            || has_word("asap")
        {
            Urgency::Urgent
        } else {
            Urgency::Routine
        }
    }
}

/// Category of a term in the medical term index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermCategory {
    Medication,
    Condition,
    Procedure,
    Anatomy,
    Lab,
}

impl fmt::Display for TermCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermCategory::Medication => write!(f, "medication"),
            TermCategory::Condition => write!(f, "condition"),
            TermCategory::Procedure => write!(f, "procedure"),
            TermCategory::Anatomy => write!(f, "anatomy"),
            TermCategory::Lab => write!(f, "lab"),
        }
    }
}

// =============================================================================
// Domain Structs
// =============================================================================

/// Type-discriminated payload for a detected action.
///
/// Exactly one shape per action type. Serialized untagged so the webhook
/// `details` object stays flat; the leading required field of each variant
/// is distinct, which keeps deserialization unambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionDetails {
    Prescription {
        medication: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        dosage: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        frequency: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration: Option<String>,
    },
    LabOrder {
        tests: Vec<String>,
        urgency: Urgency,
    },
    Referral {
        specialty: String,
        urgency: Urgency,
    },
    FollowUp {
        timeframe: String,
    },
    DiagnosticTest {
        test_name: String,
        urgency: Urgency,
    },
}

impl ActionDetails {
    /// The action type this payload shape belongs to.
    pub fn action_type(&self) -> MedActionType {
        match self {
            ActionDetails::Prescription { .. } => MedActionType::Prescription,
            ActionDetails::LabOrder { .. } => MedActionType::LabOrder,
            ActionDetails::Referral { .. } => MedActionType::Referral,
            ActionDetails::FollowUp { .. } => MedActionType::FollowUp,
            ActionDetails::DiagnosticTest { .. } => MedActionType::DiagnosticTest,
        }
    }
}

/// A structured clinical action extracted from a clinician utterance.
///
/// Carries no identity of its own; callers assign an id when they persist
/// or deliver it. Construction through `new` keeps confidence clamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedAction {
    pub action_type: MedActionType,
    pub details: ActionDetails,
    /// Always within [0, 1].
    pub confidence: f32,
    pub source_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_terms: Vec<TermMatch>,
}

impl DetectedAction {
    pub fn new(
        details: ActionDetails,
        confidence: f32,
        source_text: &str,
        matched_terms: Vec<TermMatch>,
    ) -> Self {
        Self {
            action_type: details.action_type(),
            confidence: confidence.clamp(0.0, 1.0),
            details,
            source_text: source_text.to_string(),
            matched_terms,
        }
    }
}

/// Where an utterance came from, for callers that persist results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectionContext {
    pub conversation_id: Uuid,
    pub utterance_id: Uuid,
}

// =============================================================================
// Tests
// =============================================================================
