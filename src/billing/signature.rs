//! HMAC-SHA256 signatures used by the payment provider.
//!
//! Checkout callbacks are signed over `"<order_id>|<payment_id>"` with the
//! key secret; webhooks are signed over the raw request body with the
//! webhook secret. Both arrive hex-encoded.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Returns the hex-encoded HMAC-SHA256 of `message` under `secret`.
#[must_use]
pub fn sign(secret: &str, message: &[u8]) -> String {
    let mut mac = mac(secret);
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks a hex signature in constant time. Malformed hex never matches.
#[must_use]
pub fn verify(secret: &str, message: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let mut mac = mac(secret);
    mac.update(message);
    mac.verify_slice(&expected).is_ok()
}

#[must_use]
pub fn payment_message(order_id: &str, payment_id: &str) -> String {
    format!("{order_id}|{payment_id}")
}

/// Verifies a checkout callback.
#[must_use]
pub fn verify_payment(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    verify(secret, payment_message(order_id, payment_id).as_bytes(), signature)
}

fn mac(secret: &str) -> HmacSha256 {
    <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length")
}
