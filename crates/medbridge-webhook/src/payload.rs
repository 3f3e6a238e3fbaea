//! Canonical webhook payload.
//!
//! The serialized form is part of the wire contract: field order is
//! fixed by declaration order, and the HMAC signature is computed over
//! the exact serialized bytes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use medbridge_detect::{ActionDetails, DetectedAction, MedActionType};

/// Event name carried in the payload and the `X-Webhook-Event` header.
pub const WEBHOOK_EVENT: &str = "medical.action.detected";

/// The notification body POSTed to webhook receivers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    pub action: ActionBody,
    pub conversation: ConversationRef,
    /// ISO-8601 creation time of the payload.
    pub timestamp: String,
}

/// The action portion of the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionBody {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub action_type: MedActionType,
    pub details: ActionDetails,
    pub confidence: f32,
}

/// Reference to the conversation the action came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRef {
    pub id: Uuid,
}

impl WebhookPayload {
    /// Build a payload for a validated action.
    ///
    /// `action_id` is the identity assigned when the action was persisted;
    /// detection itself produces anonymous actions.
    pub fn new(action: &DetectedAction, action_id: Uuid, conversation_id: Uuid) -> Self {
        Self {
            event: WEBHOOK_EVENT.to_string(),
            action: ActionBody {
                id: action_id,
                action_type: action.action_type,
                details: action.details.clone(),
                confidence: action.confidence,
            },
            conversation: ConversationRef {
                id: conversation_id,
            },
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Serialize to the exact JSON the signature covers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Tests
// =============================================================================
