//! HMAC-SHA256 payload signing.
//!
//! The signature covers the exact serialized payload bytes and is sent
//! as `sha256=<hex>` in the `X-Webhook-Signature` header so receivers
//! can verify origin and integrity.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Sign a serialized payload with the shared secret.
pub fn sign(secret: &str, body: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body.as_bytes());
    format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Verify a signature against a serialized payload.
///
/// Comparison is constant-time via the MAC verifier. Any malformed
/// signature (wrong prefix, bad hex) simply fails verification.
pub fn verify(secret: &str, body: &str, signature: &str) -> bool {
    let Some(hex_digest) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

// =============================================================================
// Tests
// =============================================================================
