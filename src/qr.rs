//! QR token generation and signature verification
//!
//! A mission's printed QR payload is either the bare `qr_code` or
//! `<qr_code>.<signature>`, where the signature is a hex HMAC-SHA256 of the
//! code keyed by the mission's `qr_secret`. The code charset is
//! `[A-Z0-9_]`, so `.` never appears inside a code.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_SEPARATOR: char = '.';

/// A decoded QR payload split into code and optional signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrPayload<'a> {
    pub code: &'a str,
    pub signature: Option<&'a str>,
}

impl<'a> QrPayload<'a> {
    /// Split a raw payload. Returns None for payloads that cannot be a token.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.split_once(SIGNATURE_SEPARATOR) {
            Some((code, sig)) if !code.is_empty() && !sig.is_empty() => Some(Self {
                code,
                signature: Some(sig),
            }),
            Some(_) => None,
            None => Some(Self {
                code: raw,
                signature: None,
            }),
        }
    }
}

/// Generate a human-legible token: `QR_<CATEGORY>_<millis>`
pub fn generate_code(category: &str, now_ms: i64) -> String {
    format!("QR_{}_{}", category_prefix(category), now_ms)
}

fn category_prefix(category: &str) -> String {
    let mapped: String = category
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = mapped.trim_matches('_');
    if trimmed.is_empty() {
        "MISSION".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Generate a fresh random signing secret
pub fn generate_secret() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Hex HMAC-SHA256 of `code` keyed by `secret`
pub fn sign(code: &str, secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(code.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Full payload to print into the QR image
pub fn signed_payload(code: &str, secret: &str) -> Option<String> {
    sign(code, secret).map(|sig| format!("{code}{SIGNATURE_SEPARATOR}{sig}"))
}

/// Constant-time check of a hex signature
pub fn verify(code: &str, secret: &str, signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(code.as_bytes());
    mac.verify_slice(&expected).is_ok()
}
