//! `X-Hub-Signature-256` verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw body, keyed by
//! the webhook secret, and sends it as `sha256=<hex>`. Deliveries that fail
//! verification are rejected before the body is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const PREFIX: &str = "sha256=";

/// Decodes the digest out of a signature header. `None` if malformed.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    hex::decode(header.strip_prefix(PREFIX)?).ok()
}

/// Checks `signature_header` against the HMAC of `payload` under `secret`.
///
/// The comparison is constant-time.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Produces the header GitHub would send for `payload`.
#[cfg(test)]
pub fn sign_payload(payload: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).unwrap();
    mac.update(payload);
    format!("{}{}", PREFIX, hex::encode(mac.finalize().into_bytes()))
}
