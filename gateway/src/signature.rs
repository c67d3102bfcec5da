//! Checkout payment signatures.
//!
//! The gateway signs `{order_id}|{payment_id}` with the key secret using
//! HMAC-SHA256 and hands the hex digest to the browser.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str, order_id: &str, payment_id: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Some(mac)
}

/// hex signature for the order and payment
pub fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
    mac(secret, order_id, payment_id)
        .map(|m| hex::encode(m.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Constant time check of a hex signature.
pub fn verify(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let expected = match hex::decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    mac(secret, order_id, payment_id)
        .map(|m| m.verify_slice(&expected).is_ok())
        .unwrap_or(false)
}
