//! End-to-end session pipeline tests over the in-process transport.
//!
//! Drives a full interpretation exchange: connect, speech markers,
//! transcription, assistant translation, disconnect.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::mpsc;

use medbridge_core::config::SessionConfig;
use medbridge_core::{DomainEvent, SessionStatus};
use medbridge_session::{
    ChannelTransport, SessionConnection, SessionError, SessionToken, TokenProvider,
    TransportEvent,
};

struct StaticTokenProvider;

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn fetch_token(&self) -> Result<SessionToken, SessionError> {
        Ok(SessionToken::new("itest-token"))
    }
}

async fn wait_for(
    rx: &mut broadcast::Receiver<DomainEvent>,
    predicate: impl Fn(&DomainEvent) -> bool,
) -> DomainEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed");
        if predicate(&event) {
            return event;
        }
    }
}

async fn send_frame(tx: &mpsc::Sender<TransportEvent>, frame: &str) {
    tx.send(TransportEvent::Message(frame.to_string()))
        .await
        .expect("transport channel open");
}

#[tokio::test]
async fn full_exchange_produces_correlated_events() {
    medbridge_core::logging::init();

    let conn = SessionConnection::new(&SessionConfig::default());
    let mut rx = conn.subscribe();
    let (transport, tx) = ChannelTransport::new(32);

    conn.connect(&StaticTokenProvider, &transport)
        .await
        .unwrap();
    tx.send(TransportEvent::Connected).await.unwrap();
    wait_for(&mut rx, |e| {
        matches!(
            e,
            DomainEvent::StatusChanged {
                status: SessionStatus::Connected,
                ..
            }
        )
    })
    .await;

    // Clinician speaks.
    send_frame(&tx, r#"{"type":"input_audio_buffer.speech_started"}"#).await;
    send_frame(&tx, r#"{"type":"input_audio_buffer.speech_stopped"}"#).await;
    send_frame(
        &tx,
        r#"{"type":"input_audio_transcription.completed","transcript":"Take one tablet twice a day"}"#,
    )
    .await;

    wait_for(&mut rx, |e| matches!(e, DomainEvent::SpeechStarted { .. })).await;
    wait_for(&mut rx, |e| matches!(e, DomainEvent::SpeechStopped { .. })).await;
    let utterance_id = match wait_for(&mut rx, |e| {
        matches!(e, DomainEvent::UtteranceProduced { .. })
    })
    .await
    {
        DomainEvent::UtteranceProduced { utterance, .. } => {
            assert_eq!(utterance.language, "en");
            assert_eq!(utterance.sequence, 0);
            utterance.id
        }
        other => panic!("Expected UtteranceProduced, got {:?}", other),
    };

    // Interpreter answers: deltas are informational, done completes.
    send_frame(
        &tx,
        r#"{"type":"response.audio_transcript.delta","delta":"Tome"}"#,
    )
    .await;
    send_frame(
        &tx,
        r#"{"type":"response.audio_transcript.done","transcript":"Tome una tableta dos veces al dia"}"#,
    )
    .await;

    match wait_for(&mut rx, |e| {
        matches!(e, DomainEvent::TranslationProduced { .. })
    })
    .await
    {
        DomainEvent::TranslationProduced { translation, .. } => {
            assert_eq!(translation.utterance_id, utterance_id);
            assert_eq!(translation.language, "es");
        }
        other => panic!("Expected TranslationProduced, got {:?}", other),
    }

    conn.disconnect().await;
    assert_eq!(conn.status(), SessionStatus::Disconnected);
}

#[tokio::test]
async fn late_translation_attaches_to_most_recent_utterance() {
    // Documents the single-slot correlation heuristic: two utterances
    // before any translation, one translation arriving afterwards.
    let conn = SessionConnection::new(&SessionConfig::default());
    let mut rx = conn.subscribe();
    let (transport, tx) = ChannelTransport::new(32);

    conn.connect(&StaticTokenProvider, &transport)
        .await
        .unwrap();
    tx.send(TransportEvent::Connected).await.unwrap();

    send_frame(
        &tx,
        r#"{"type":"input_audio_transcription.completed","transcript":"Does it hurt here"}"#,
    )
    .await;
    send_frame(
        &tx,
        r#"{"type":"input_audio_transcription.completed","transcript":"Or does it hurt there"}"#,
    )
    .await;

    let first = match wait_for(&mut rx, |e| {
        matches!(e, DomainEvent::UtteranceProduced { .. })
    })
    .await
    {
        DomainEvent::UtteranceProduced { utterance, .. } => utterance.id,
        other => panic!("Expected UtteranceProduced, got {:?}", other),
    };
    let second = match wait_for(&mut rx, |e| {
        matches!(e, DomainEvent::UtteranceProduced { .. })
    })
    .await
    {
        DomainEvent::UtteranceProduced { utterance, .. } => utterance.id,
        other => panic!("Expected UtteranceProduced, got {:?}", other),
    };

    send_frame(
        &tx,
        r#"{"type":"response.audio_transcript.done","transcript":"Le duele aqui"}"#,
    )
    .await;

    match wait_for(&mut rx, |e| {
        matches!(e, DomainEvent::TranslationProduced { .. })
    })
    .await
    {
        DomainEvent::TranslationProduced { translation, .. } => {
            assert_eq!(translation.utterance_id, second);
            assert_ne!(translation.utterance_id, first);
        }
        other => panic!("Expected TranslationProduced, got {:?}", other),
    }

    conn.disconnect().await;
}

#[tokio::test]
async fn conversation_item_path_produces_utterances_too() {
    let conn = SessionConnection::new(&SessionConfig::default());
    let mut rx = conn.subscribe();
    let (transport, tx) = ChannelTransport::new(32);

    conn.connect(&StaticTokenProvider, &transport)
        .await
        .unwrap();
    tx.send(TransportEvent::Connected).await.unwrap();

    send_frame(
        &tx,
        r#"{"type":"conversation.item.created","item":{"role":"user","content":[{"type":"input_audio","transcript":"I will order an x-ray"}]}}"#,
    )
    .await;

    match wait_for(&mut rx, |e| {
        matches!(e, DomainEvent::UtteranceProduced { .. })
    })
    .await
    {
        DomainEvent::UtteranceProduced { utterance, .. } => {
            assert_eq!(utterance.text, "I will order an x-ray");
        }
        other => panic!("Expected UtteranceProduced, got {:?}", other),
    }

    conn.disconnect().await;
}
