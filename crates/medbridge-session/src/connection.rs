//! The interpretation session connection.
//!
//! `SessionConnection` owns the transport lifecycle: it fetches a
//! short-lived credential, establishes the realtime transport, pumps
//! inbound frames through the normalizer, and broadcasts the resulting
//! domain events to any number of subscribers.

use chrono::Utc;
use std::sync::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use medbridge_core::config::SessionConfig;
use medbridge_core::{DomainEvent, LanguagePair, SessionStatus};

use crate::error::SessionError;
use crate::normalizer::EventNormalizer;
use crate::protocol::ServerEvent;
use crate::state::StateMachine;
use crate::transport::{
    RealtimeTransport, TokenProvider, TransportCloser, TransportEvent, TransportHandle,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One realtime interpretation session.
///
/// `connect`/`disconnect` are not reentrant; a second `connect` while the
/// session is active is rejected by the status state machine.
/// `disconnect` is safe to call from any state, any number of times.
pub struct SessionConnection {
    state: StateMachine,
    languages: LanguagePair,
    event_tx: broadcast::Sender<DomainEvent>,
    pump: Mutex<Option<JoinHandle<()>>>,
    closer: Mutex<Option<TransportCloser>>,
}

impl SessionConnection {
    /// Create an idle session for the configured language pair.
    pub fn new(config: &SessionConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: StateMachine::new(),
            languages: LanguagePair::new(
                config.primary_language.clone(),
                config.secondary_language.clone(),
            ),
            event_tx,
            pump: Mutex::new(None),
            closer: Mutex::new(None),
        }
    }

    /// Subscribe to this session's domain events.
    ///
    /// Every subscriber receives every event; subscriptions are scoped to
    /// this instance and die with their receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    /// Current connection status.
    pub fn status(&self) -> SessionStatus {
        self.state.current()
    }

    /// The session's language pair.
    pub fn languages(&self) -> &LanguagePair {
        &self.languages
    }

    /// Establish the session: credential fetch, transport connect, event
    /// pump start.
    ///
    /// Fails fast on any stage: the status transitions to `Error`, an
    /// `ErrorOccurred` event is emitted, and the error is returned.
    pub async fn connect(
        &self,
        token_provider: &dyn TokenProvider,
        transport: &dyn RealtimeTransport,
    ) -> Result<(), SessionError> {
        self.state.transition(SessionStatus::Connecting)?;
        self.broadcast_status(SessionStatus::Connecting);

        let token = match token_provider.fetch_token().await {
            Ok(token) => token,
            Err(e) => {
                self.fail(&e.to_string());
                return Err(e);
            }
        };

        let TransportHandle { events, closer } = match transport.connect(&token).await {
            Ok(handle) => handle,
            Err(e) => {
                self.fail(&e.to_string());
                return Err(e);
            }
        };

        *self.closer.lock().expect("closer mutex poisoned") = Some(closer.clone());

        let pump = tokio::spawn(run_event_pump(
            events,
            EventNormalizer::new(self.languages.clone()),
            self.event_tx.clone(),
            self.state.clone(),
            closer,
        ));
        *self.pump.lock().expect("pump mutex poisoned") = Some(pump);

        info!(
            primary = %self.languages.primary,
            secondary = %self.languages.secondary,
            "Session connecting"
        );
        Ok(())
    }

    /// Tear the session down.
    ///
    /// Idempotent: calls past the first are no-ops. Pending translation
    /// correlation state dies with the event pump. Outstanding webhook
    /// deliveries are unaffected; they are not owned by the session.
    pub async fn disconnect(&self) {
        if self.state.current() == SessionStatus::Disconnected {
            return;
        }

        let closer = self.closer.lock().expect("closer mutex poisoned").take();
        if let Some(closer) = closer {
            closer.close();
        }

        let pump = self.pump.lock().expect("pump mutex poisoned").take();
        if let Some(pump) = pump {
            pump.abort();
            let _ = pump.await;
        }

        if self.state.transition(SessionStatus::Disconnected).is_ok() {
            self.broadcast_status(SessionStatus::Disconnected);
            info!("Session disconnected");
        }
    }

    fn broadcast_status(&self, status: SessionStatus) {
        let _ = self.event_tx.send(DomainEvent::StatusChanged {
            status,
            timestamp: Utc::now(),
        });
    }

    /// Transition to `Error` and surface the failure to subscribers.
    fn fail(&self, message: &str) {
        let _ = self.state.transition(SessionStatus::Error);
        let _ = self.event_tx.send(DomainEvent::ErrorOccurred {
            message: message.to_string(),
            timestamp: Utc::now(),
        });
        self.broadcast_status(SessionStatus::Error);
    }
}

/// Reads transport events until the channel closes or connectivity fails.
async fn run_event_pump(
    mut events: mpsc::Receiver<TransportEvent>,
    mut normalizer: EventNormalizer,
    event_tx: broadcast::Sender<DomainEvent>,
    state: StateMachine,
    closer: TransportCloser,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Connected => {
                if state.transition(SessionStatus::Connected).is_ok() {
                    let _ = event_tx.send(DomainEvent::StatusChanged {
                        status: SessionStatus::Connected,
                        timestamp: Utc::now(),
                    });
                }
            }
            TransportEvent::Message(raw) => match ServerEvent::parse(&raw) {
                Ok(Some(server_event)) => {
                    if let Some(domain_event) = normalizer.handle(server_event) {
                        let _ = event_tx.send(domain_event);
                    }
                }
                Ok(None) => {} // unrecognized type, ignored
                Err(e) => {
                    warn!("Malformed inbound frame dropped: {}", e);
                }
            },
            TransportEvent::Failed(message) => {
                let _ = state.transition(SessionStatus::Error);
                let _ = event_tx.send(DomainEvent::ErrorOccurred {
                    message,
                    timestamp: Utc::now(),
                });
                let _ = event_tx.send(DomainEvent::StatusChanged {
                    status: SessionStatus::Error,
                    timestamp: Utc::now(),
                });
                closer.close();
                break;
            }
            TransportEvent::Closed => break,
        }
    }
    normalizer.reset();
}

// =============================================================================
// Tests
// =============================================================================
