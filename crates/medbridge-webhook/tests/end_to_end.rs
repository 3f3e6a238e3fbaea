//! Detection-to-delivery integration tests.
//!
//! Runs the rule engine over clinician utterances and pushes the
//! detected actions through the full signing and delivery path with a
//! mock HTTP receiver.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use medbridge_core::Speaker;
use medbridge_detect::{ActionDetector, DetectionContext, MedActionType};
use medbridge_webhook::{
    verify, DeliveryError, DeliveryStatus, HttpPoster, PostResponse, RetryPolicy,
    WebhookDelivery,
};

const SECRET: &str = "whsec_integration";

/// Receiver that records every request and answers 200.
struct RecordingReceiver {
    requests: Mutex<Vec<(String, String, Vec<(&'static str, String)>)>>,
}

impl RecordingReceiver {
    fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HttpPoster for RecordingReceiver {
    async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &[(&'static str, String)],
    ) -> Result<PostResponse, DeliveryError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.to_string(), headers.to_vec()));
        Ok(PostResponse {
            status: 200,
            body: "accepted".to_string(),
        })
    }
}

fn context() -> DetectionContext {
    DetectionContext {
        conversation_id: Uuid::new_v4(),
        utterance_id: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn detected_prescription_arrives_signed_and_verifiable() {
    medbridge_core::logging::init();

    let detector = ActionDetector::new();
    let ctx = context();
    let actions = detector.detect(
        "I'm prescribing ibuprofen 400 milligrams three times daily",
        Speaker::Clinician,
        &ctx,
    );
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action_type, MedActionType::Prescription);
    assert!(actions[0].confidence >= 0.5);

    let receiver = Arc::new(RecordingReceiver::new());
    let delivery = WebhookDelivery::with_poster(
        receiver.clone(),
        SECRET,
        RetryPolicy::default(),
    );

    let action_id = Uuid::new_v4();
    let outcome = delivery
        .deliver(
            &actions[0],
            action_id,
            ctx.conversation_id,
            "https://ehr.example/hooks/actions",
        )
        .await;
    assert_eq!(outcome.status, DeliveryStatus::Sent);

    let requests = receiver.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (url, body, headers) = &requests[0];
    assert_eq!(url, "https://ehr.example/hooks/actions");

    // Body is the canonical payload
    assert!(body.starts_with(r#"{"event":"medical.action.detected","#));
    assert!(body.contains(r#""type":"prescription""#));
    assert!(body.contains(r#""medication":"ibuprofen""#));
    assert!(body.contains(&format!(r#""conversation":{{"id":"{}"}}"#, ctx.conversation_id)));

    // Signature in the headers verifies against the exact body
    let signature = headers
        .iter()
        .find(|(name, _)| *name == "X-Webhook-Signature")
        .map(|(_, value)| value.clone())
        .expect("signature header present");
    assert!(verify(SECRET, body, &signature));
}

#[tokio::test]
async fn patient_speech_produces_nothing_to_deliver() {
    let detector = ActionDetector::new();
    let actions = detector.detect("Me duele la cabeza", Speaker::Patient, &context());
    assert!(actions.is_empty());
}

#[tokio::test(start_paused = true)]
async fn unreachable_receiver_exhausts_retries() {
    struct UnreachableReceiver;

    #[async_trait]
    impl HttpPoster for UnreachableReceiver {
        async fn post(
            &self,
            _url: &str,
            _body: &str,
            _headers: &[(&'static str, String)],
        ) -> Result<PostResponse, DeliveryError> {
            Err(DeliveryError::Http("dns error: name not resolved".to_string()))
        }
    }

    let detector = ActionDetector::new();
    let ctx = context();
    let actions = detector.detect("Follow up in two weeks", Speaker::Clinician, &ctx);
    assert_eq!(actions.len(), 1);

    let delivery = WebhookDelivery::with_poster(
        Arc::new(UnreachableReceiver),
        SECRET,
        RetryPolicy::default(),
    );

    let action_id = Uuid::new_v4();
    let started = tokio::time::Instant::now();
    let outcome = delivery
        .deliver(
            &actions[0],
            action_id,
            ctx.conversation_id,
            "https://nowhere.invalid/hook",
        )
        .await;

    assert_eq!(outcome.status, DeliveryStatus::Failed);
    assert_eq!(outcome.attempts, 3);
    assert!(outcome.error.unwrap().contains("dns error"));
    // Delays of 2s and 4s separate the three attempts
    assert_eq!(started.elapsed(), Duration::from_secs(6));

    let records = delivery.tracker().for_action(action_id);
    assert_eq!(records[0].status, DeliveryStatus::Failed);
    assert_eq!(records[0].attempts, 3);
}
