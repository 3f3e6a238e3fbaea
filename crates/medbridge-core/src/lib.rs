//! Shared types, events, errors, and configuration for MedBridge.
//!
//! MedBridge turns a realtime interpretation stream between a clinician
//! and a patient into typed domain events, detects clinical actions in
//! clinician speech, and notifies external systems via signed webhooks.
//! This crate holds the vocabulary the other crates speak.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod types;

pub use config::MedBridgeConfig;
pub use error::{MedBridgeError, Result};
pub use events::DomainEvent;
pub use types::{LanguagePair, SessionStatus, Speaker, Translation, Utterance};
