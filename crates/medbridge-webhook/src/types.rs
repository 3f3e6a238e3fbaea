//! Types for webhook delivery tracking and retry policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use medbridge_core::config::WebhookConfig;
use medbridge_core::MedBridgeError;

// =============================================================================
// Enums
// =============================================================================

/// Lifecycle status of one webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Attempts are still being made.
    Pending,
    /// A 2xx response was received. Terminal.
    Sent,
    /// All attempts exhausted. Terminal.
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            _ => Err(format!("Unknown delivery status: {}", s)),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors from one delivery attempt.
///
/// A timeout is reported distinctly from a non-2xx response so receivers
/// that are slow and receivers that reject can be told apart.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
    #[error("Receiver returned status {0}")]
    Status(u16),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Payload serialization failed: {0}")]
    Serialization(String),
}

impl From<DeliveryError> for MedBridgeError {
    fn from(err: DeliveryError) -> Self {
        MedBridgeError::Delivery(err.to_string())
    }
}

// =============================================================================
// Retry policy
// =============================================================================

/// Exponential backoff policy for delivery retries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts before a delivery is marked failed.
    pub max_attempts: u32,
    /// Base delay; the wait after attempt n is `base * 2^(n-1)`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &WebhookConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_secs(config.base_delay_secs),
        }
    }

    /// Delay scheduled after a failed attempt `n` (1-based): `base * 2^(n-1)`.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

// =============================================================================
// Delivery records
// =============================================================================

/// Tracked state of one webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAttempt {
    pub id: Uuid,
    pub action_id: Uuid,
    pub url: String,
    /// Attempts made so far.
    pub attempts: u32,
    pub status: DeliveryStatus,
    pub last_error: Option<String>,
    pub last_response_status: Option<u16>,
    pub updated_at: DateTime<Utc>,
}

/// Terminal result of a delivery, returned to the caller.
///
/// Delivery failures are recorded, never raised: this type is always
/// returned, with `status` telling the outcome.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub attempt_id: Uuid,
    pub status: DeliveryStatus,
    pub attempts: u32,
    pub response_status: Option<u16>,
    pub error: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================
