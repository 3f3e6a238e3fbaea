//! Signed webhook delivery for detected medical actions.
//!
//! Builds the canonical notification payload, signs it with HMAC-SHA256,
//! POSTs it to the receiver, and retries with exponential backoff.
//! Delivery state is tracked per action and inspectable at any time;
//! deliveries run as independent tasks and are not cancelled by a
//! session ending.

pub mod delivery;
pub mod payload;
pub mod signature;
pub mod types;

pub use delivery::{DeliveryTracker, HttpPoster, PostResponse, ReqwestPoster, WebhookDelivery};
pub use payload::{WebhookPayload, WEBHOOK_EVENT};
pub use signature::{sign, verify};
pub use types::{DeliveryError, DeliveryOutcome, DeliveryStatus, RetryPolicy, WebhookAttempt};
