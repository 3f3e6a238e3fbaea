//! Realtime interpretation session management for MedBridge.
//!
//! Owns the connection lifecycle to the realtime voice provider, parses
//! the inbound protocol event stream, and normalizes it into the typed
//! domain events of `medbridge-core`. Subscribers receive events through
//! a broadcast channel scoped to the session instance.

pub mod connection;
pub mod error;
pub mod normalizer;
pub mod protocol;
pub mod state;
pub mod transport;

pub use connection::SessionConnection;
pub use error::SessionError;
pub use normalizer::EventNormalizer;
pub use protocol::ServerEvent;
pub use state::StateMachine;
pub use transport::{
    ChannelTransport, HttpTokenProvider, RealtimeTransport, SessionToken, TokenProvider,
    TransportCloser, TransportEvent, TransportHandle,
};
