//! Transport and credential seams for the realtime connection.
//!
//! The actual media transport (WebRTC peer connection, audio track, data
//! channel) lives behind the `RealtimeTransport` trait so the session
//! logic can be driven by an in-process channel in tests and by a real
//! provider binding in production.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tokio::sync::{mpsc, watch};

use crate::error::SessionError;

/// A short-lived credential minted by the token endpoint.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }
}

/// Fetches transport credentials from an external endpoint.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<SessionToken, SessionError>;
}

/// Token provider backed by an HTTP endpoint.
///
/// POSTs to the configured endpoint and reads the ephemeral credential
/// from `client_secret.value` in the JSON response.
pub struct HttpTokenProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTokenProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn fetch_token(&self) -> Result<SessionToken, SessionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| SessionError::Token(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SessionError::Token(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SessionError::Token(e.to_string()))?;

        let value = body
            .pointer("/client_secret/value")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                SessionError::Token("response carries no client_secret.value".to_string())
            })?;

        let expires_at = body
            .pointer("/client_secret/expires_at")
            .and_then(serde_json::Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        Ok(SessionToken {
            value: value.to_string(),
            expires_at,
        })
    }
}

/// Events surfaced by the transport on its ordered event channel.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Underlying connectivity reached the connected state.
    Connected,
    /// One raw protocol frame (JSON text) from the provider.
    Message(String),
    /// Connectivity failed; the session should transition to error.
    Failed(String),
    /// The transport closed cleanly.
    Closed,
}

/// Signals the transport implementation to shut down.
///
/// Backed by a watch channel so a shutdown requested before a waiter
/// registers is still observed.
#[derive(Debug, Clone)]
pub struct TransportCloser {
    signal: watch::Sender<bool>,
}

impl Default for TransportCloser {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportCloser {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self { signal }
    }

    /// Request shutdown of the transport.
    pub fn close(&self) {
        // send_replace stores the value even with no receivers subscribed
        self.signal.send_replace(true);
    }

    /// Whether shutdown has been requested.
    pub fn is_closed(&self) -> bool {
        *self.signal.borrow()
    }

    /// Resolves when shutdown has been requested. For transport
    /// implementations to select on.
    pub async fn closed(&self) {
        let mut rx = self.signal.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

/// A live transport: the ordered event channel plus its shutdown signal.
pub struct TransportHandle {
    pub events: mpsc::Receiver<TransportEvent>,
    pub closer: TransportCloser,
}

/// Establishes the realtime media/data transport with a credential.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn connect(&self, token: &SessionToken) -> Result<TransportHandle, SessionError>;
}

/// In-process transport backed by an mpsc channel.
///
/// The returned sender side injects transport events; used by tests and
/// local loopback setups. `connect` can only succeed once per instance.
pub struct ChannelTransport {
    receiver: Mutex<Option<mpsc::Receiver<TransportEvent>>>,
}

impl ChannelTransport {
    pub fn new(buffer: usize) -> (Self, mpsc::Sender<TransportEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            Self {
                receiver: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

#[async_trait]
impl RealtimeTransport for ChannelTransport {
    async fn connect(&self, _token: &SessionToken) -> Result<TransportHandle, SessionError> {
        let events = self
            .receiver
            .lock()
            .expect("receiver mutex poisoned")
            .take()
            .ok_or_else(|| SessionError::Transport("transport already connected".to_string()))?;
        Ok(TransportHandle {
            events,
            closer: TransportCloser::new(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
