//! Webhook delivery with retry, backoff, and per-action tracking.
//!
//! Each delivery runs the full attempt loop itself; concurrent
//! deliveries for different actions share nothing but the tracker map.
//! A session disconnecting does not cancel in-flight deliveries.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use medbridge_core::config::WebhookConfig;
use medbridge_detect::DetectedAction;

use crate::payload::{WebhookPayload, WEBHOOK_EVENT};
use crate::signature;
use crate::types::{
    DeliveryError, DeliveryOutcome, DeliveryStatus, RetryPolicy, WebhookAttempt,
};

/// Response from a successful POST.
#[derive(Debug, Clone)]
pub struct PostResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP seam for webhook POSTs, mockable in tests.
#[async_trait]
pub trait HttpPoster: Send + Sync {
    async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &[(&'static str, String)],
    ) -> Result<PostResponse, DeliveryError>;
}

/// Production poster backed by reqwest with a per-attempt timeout.
pub struct ReqwestPoster {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestPoster {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl HttpPoster for ReqwestPoster {
    async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &[(&'static str, String)],
    ) -> Result<PostResponse, DeliveryError> {
        let mut request = self.client.post(url).timeout(self.timeout);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        let response = request.body(body.to_string()).send().await.map_err(|e| {
            if e.is_timeout() {
                DeliveryError::Timeout(self.timeout.as_secs())
            } else {
                DeliveryError::Http(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(DeliveryError::Status(status));
        }
        let body = response.text().await.unwrap_or_default();
        Ok(PostResponse { status, body })
    }
}

/// In-memory registry of delivery attempts, inspectable by callers.
#[derive(Default)]
pub struct DeliveryTracker {
    attempts: Mutex<Vec<WebhookAttempt>>,
}

impl DeliveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn create(&self, action_id: Uuid, url: &str) -> WebhookAttempt {
        let attempt = WebhookAttempt {
            id: Uuid::new_v4(),
            action_id,
            url: url.to_string(),
            attempts: 0,
            status: DeliveryStatus::Pending,
            last_error: None,
            last_response_status: None,
            updated_at: Utc::now(),
        };
        self.lock().push(attempt.clone());
        attempt
    }

    fn record_attempt(&self, id: Uuid) {
        let mut attempts = self.lock();
        if let Some(attempt) = attempts.iter_mut().find(|a| a.id == id) {
            attempt.attempts += 1;
            attempt.updated_at = Utc::now();
        }
    }

    fn mark_sent(&self, id: Uuid, response_status: u16) {
        let mut attempts = self.lock();
        if let Some(attempt) = attempts.iter_mut().find(|a| a.id == id) {
            attempt.status = DeliveryStatus::Sent;
            attempt.last_response_status = Some(response_status);
            attempt.last_error = None;
            attempt.updated_at = Utc::now();
        }
    }

    fn mark_failed(&self, id: Uuid, error: &str) {
        let mut attempts = self.lock();
        if let Some(attempt) = attempts.iter_mut().find(|a| a.id == id) {
            attempt.status = DeliveryStatus::Failed;
            attempt.last_error = Some(error.to_string());
            attempt.updated_at = Utc::now();
        }
    }

    /// Get one delivery record by id.
    pub fn get(&self, id: Uuid) -> Option<WebhookAttempt> {
        self.lock().iter().find(|a| a.id == id).cloned()
    }

    /// All delivery records for an action.
    pub fn for_action(&self, action_id: Uuid) -> Vec<WebhookAttempt> {
        self.lock()
            .iter()
            .filter(|a| a.action_id == action_id)
            .cloned()
            .collect()
    }

    /// List records, optionally filtered by status.
    pub fn list(&self, status: Option<DeliveryStatus>) -> Vec<WebhookAttempt> {
        self.lock()
            .iter()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<WebhookAttempt>> {
        self.attempts.lock().expect("attempts mutex poisoned")
    }
}

/// Signs and delivers action notifications with retry.
pub struct WebhookDelivery {
    poster: Arc<dyn HttpPoster>,
    secret: String,
    policy: RetryPolicy,
    tracker: Arc<DeliveryTracker>,
}

impl WebhookDelivery {
    /// Build a delivery service from configuration, using reqwest.
    pub fn new(config: &WebhookConfig) -> Self {
        Self::with_poster(
            Arc::new(ReqwestPoster::new(Duration::from_secs(config.timeout_secs))),
            config.secret.clone(),
            RetryPolicy::from_config(config),
        )
    }

    /// Build a delivery service with an injected poster (tests, proxies).
    pub fn with_poster(
        poster: Arc<dyn HttpPoster>,
        secret: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            poster,
            secret: secret.into(),
            policy,
            tracker: Arc::new(DeliveryTracker::new()),
        }
    }

    /// The shared tracker; delivery status is inspectable at any time.
    pub fn tracker(&self) -> Arc<DeliveryTracker> {
        Arc::clone(&self.tracker)
    }

    /// Deliver one action notification, retrying with exponential
    /// backoff until success or attempt exhaustion.
    ///
    /// A 2xx response halts immediately with `Sent`; after the final
    /// failed attempt the record is marked `Failed` with the last error.
    /// Never returns an error to the caller.
    pub async fn deliver(
        &self,
        action: &DetectedAction,
        action_id: Uuid,
        conversation_id: Uuid,
        url: &str,
    ) -> DeliveryOutcome {
        let record = self.tracker.create(action_id, url);

        let payload = WebhookPayload::new(action, action_id, conversation_id);
        let body = match payload.to_json() {
            Ok(body) => body,
            Err(e) => {
                let message = DeliveryError::Serialization(e.to_string()).to_string();
                self.tracker.mark_failed(record.id, &message);
                return DeliveryOutcome {
                    attempt_id: record.id,
                    status: DeliveryStatus::Failed,
                    attempts: 0,
                    response_status: None,
                    error: Some(message),
                };
            }
        };

        let headers: [(&'static str, String); 4] = [
            ("Content-Type", "application/json".to_string()),
            ("X-Webhook-Signature", signature::sign(&self.secret, &body)),
            ("X-Webhook-Event", WEBHOOK_EVENT.to_string()),
            ("X-Webhook-Timestamp", payload.timestamp.clone()),
        ];

        let mut last_error = String::new();
        for attempt in 1..=self.policy.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.policy.backoff_after(attempt - 1)).await;
            }
            self.tracker.record_attempt(record.id);

            match self.poster.post(url, &body, &headers).await {
                Ok(response) => {
                    self.tracker.mark_sent(record.id, response.status);
                    info!(
                        action_id = %action_id,
                        attempts = attempt,
                        status = response.status,
                        "Webhook delivered"
                    );
                    return DeliveryOutcome {
                        attempt_id: record.id,
                        status: DeliveryStatus::Sent,
                        attempts: attempt,
                        response_status: Some(response.status),
                        error: None,
                    };
                }
                Err(e) => {
                    warn!(
                        action_id = %action_id,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        "Webhook attempt failed: {}",
                        e
                    );
                    last_error = e.to_string();
                }
            }
        }

        self.tracker.mark_failed(record.id, &last_error);
        DeliveryOutcome {
            attempt_id: record.id,
            status: DeliveryStatus::Failed,
            attempts: self.policy.max_attempts,
            response_status: None,
            error: Some(last_error),
        }
    }

    /// Run a delivery as an independent task.
    ///
    /// The task owns its data and keeps running regardless of what
    /// happens to the session that produced the action.
    pub fn spawn(
        self: Arc<Self>,
        action: DetectedAction,
        action_id: Uuid,
        conversation_id: Uuid,
        url: String,
    ) -> JoinHandle<DeliveryOutcome> {
        tokio::spawn(async move {
            self.deliver(&action, action_id, conversation_id, &url)
                .await
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
