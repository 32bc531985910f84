//! Slack request signing: `X-Slack-Signature` is `v0=` followed by the hex
//! HMAC-SHA256 of `v0:{timestamp}:{body}` keyed with the signing secret.
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Requests older (or newer) than this are refused to limit replays.
pub const MAX_REQUEST_AGE_SECS: i64 = 60 * 5;

type HmacSha256 = Hmac<Sha256>;

/// Verify the signature headers of a request against the current time.
pub fn verify_slack_signature(headers: &HeaderMap, body: &[u8], signing_secret: &str) -> bool {
    verify_slack_signature_at(headers, body, signing_secret, chrono::Utc::now().timestamp())
}

pub fn verify_slack_signature_at(
    headers: &HeaderMap,
    body: &[u8],
    signing_secret: &str,
    now: i64,
) -> bool {
    let Some(sig) = header_str(headers, SIGNATURE_HEADER) else {
        return false;
    };
    let Some(ts) = header_str(headers, TIMESTAMP_HEADER) else {
        return false;
    };
    let Ok(issued) = ts.parse::<i64>() else {
        return false;
    };
    if (now - issued).abs() > MAX_REQUEST_AGE_SECS {
        return false;
    }
    let Some(expected) = sig.strip_prefix("v0=").and_then(|h| hex::decode(h).ok()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(signing_secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("v0:{ts}:").as_bytes());
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// The `X-Slack-Signature` value for `body` sent at `timestamp`.
pub fn sign(signing_secret: &str, timestamp: i64, body: &[u8]) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(signing_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::new(),
    };
    mac.update(format!("v0:{timestamp}:").as_bytes());
    mac.update(body);
    format!("v0={}", hex::encode(mac.finalize().into_bytes()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
