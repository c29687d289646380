//! Stripe webhook signature verification.
//!
//! Stripe signs webhook requests using HMAC-SHA256 and sends the result in the
//! `Stripe-Signature` header.
//! Reference: https://docs.stripe.com/webhooks#verify-manually

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

use crate::config::Secret;
use crate::stripe::error::VerificationError;
use crate::stripe::event::{EventEnvelope, VerifiedEvent};

type HmacSha256 = Hmac<Sha256>;

/// Name of the header carrying the signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// The only signature scheme Stripe currently uses for live signatures.
const SIGNATURE_SCHEME: &str = "v1";

/// Verify a Stripe webhook request and decode its event.
///
/// The signature header has the form `t=<unix>,v1=<hex>[,v1=<hex>...]`:
/// - `t`: Unix seconds when Stripe signed the payload
/// - `v1`: HMAC-SHA256 hex digest of `"{t}." + payload`, keyed by the secret
///
/// Any matching `v1` candidate is accepted. Other schemes are ignored.
///
/// # Arguments
///
/// * `payload` - The exact request body bytes
/// * `signature_header` - The `Stripe-Signature` header value, if present
/// * `secret` - The endpoint's webhook signing secret
/// * `tolerance_secs` - Maximum age of the signed timestamp; 0 disables the check
pub fn verify(
    payload: &[u8],
    signature_header: Option<&str>,
    secret: &Secret,
    tolerance_secs: u64,
) -> Result<VerifiedEvent, VerificationError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| VerificationError::UnexpectedVerificationFailure(e.to_string()))?
        .as_secs();

    verify_at(payload, signature_header, secret, tolerance_secs, now)
}

/// Same as [`verify`], with the current time supplied by the caller.
pub fn verify_at(
    payload: &[u8],
    signature_header: Option<&str>,
    secret: &Secret,
    tolerance_secs: u64,
    now: u64,
) -> Result<VerifiedEvent, VerificationError> {
    let header = signature_header.ok_or_else(|| {
        warn!("stripe_signature_header_missing");
        VerificationError::MissingOrMalformedHeader
    })?;

    if secret.is_empty() {
        warn!("stripe_webhook_secret_empty");
        return Err(VerificationError::UnexpectedVerificationFailure(
            "webhook secret is not configured".to_string(),
        ));
    }

    let parsed = ParsedHeader::parse(header).ok_or_else(|| {
        warn!(header_length = header.len(), "stripe_signature_header_unparseable");
        VerificationError::SignatureMismatch("unable to extract timestamp and signatures from header")
    })?;

    let expected = compute_signature(payload, secret, parsed.timestamp)?;

    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate));

    if !matched {
        warn!(
            candidates = parsed.signatures.len(),
            timestamp = parsed.timestamp,
            "stripe_signature_mismatch"
        );
        return Err(VerificationError::SignatureMismatch(
            "no signatures found matching the expected signature for payload",
        ));
    }

    if tolerance_secs > 0 && parsed.timestamp < now.saturating_sub(tolerance_secs) {
        warn!(
            webhook_time = parsed.timestamp,
            current_time = now,
            age_seconds = now - parsed.timestamp,
            max_age_seconds = tolerance_secs,
            "stripe_signature_stale"
        );
        return Err(VerificationError::SignatureMismatch(
            "timestamp outside the tolerance zone",
        ));
    }

    let envelope: EventEnvelope = serde_json::from_slice(payload).map_err(|e| {
        warn!(error = %e, "stripe_payload_malformed");
        VerificationError::from(e)
    })?;

    let event = VerifiedEvent::from_envelope(envelope);
    debug!(
        event_type = %event.event_type(),
        event_id = ?event.id(),
        "stripe_signature_verified"
    );

    Ok(event)
}

/// Compute the hex `v1` signature for `payload` signed at `timestamp`.
pub fn sign_payload(
    payload: &[u8],
    secret: &Secret,
    timestamp: u64,
) -> Result<String, VerificationError> {
    compute_signature(payload, secret, timestamp)
}

/// Build a complete `Stripe-Signature` header value for `payload`.
pub fn signature_header(
    payload: &[u8],
    secret: &Secret,
    timestamp: u64,
) -> Result<String, VerificationError> {
    let signature = compute_signature(payload, secret, timestamp)?;
    Ok(format!("t={},{}={}", timestamp, SIGNATURE_SCHEME, signature))
}

fn compute_signature(
    payload: &[u8],
    secret: &Secret,
    timestamp: u64,
) -> Result<String, VerificationError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose().as_bytes())
        .map_err(|e| VerificationError::UnexpectedVerificationFailure(e.to_string()))?;

    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Timestamp and `v1` candidates extracted from a signature header.
#[derive(Debug, PartialEq)]
struct ParsedHeader<'a> {
    timestamp: u64,
    signatures: Vec<&'a str>,
}

impl<'a> ParsedHeader<'a> {
    /// Returns `None` unless the header has a numeric `t` and at least one `v1`.
    fn parse(header: &'a str) -> Option<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for (key, value) in header.split(',').filter_map(|item| item.split_once('=')) {
            match key {
                "t" if timestamp.is_none() => timestamp = Some(value),
                SIGNATURE_SCHEME => signatures.push(value),
                _ => {}
            }
        }

        if signatures.is_empty() {
            return None;
        }

        let timestamp = timestamp?.parse().ok()?;
        Some(Self {
            timestamp,
            signatures,
        })
    }
}

/// Compare a computed hex digest with a header candidate without an early exit.
fn constant_time_compare(expected: &str, candidate: &str) -> bool {
    expected.len() == candidate.len()
        && expected
            .bytes()
            .zip(candidate.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;
    const PAYLOAD: &[u8] = br#"{"type":"payment_intent.succeeded","data":{"id":"pi_123"}}"#;

    fn secret() -> Secret {
        Secret::new("whsec_test_secret")
    }

    fn valid_header() -> String {
        signature_header(PAYLOAD, &secret(), NOW).unwrap()
    }

    #[test]
    fn test_verify_valid() {
        let header = valid_header();
        let event = verify_at(PAYLOAD, Some(&header), &secret(), 300, NOW).unwrap();

        assert_eq!(event.event_type(), "payment_intent.succeeded");
        assert_eq!(event.data()["id"], "pi_123");
    }

    #[test]
    fn test_verify_with_system_clock() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let header = signature_header(PAYLOAD, &secret(), now).unwrap();

        assert!(verify(PAYLOAD, Some(&header), &secret(), 300).is_ok());
    }

    #[test]
    fn test_verify_missing_header() {
        let err = verify_at(PAYLOAD, None, &secret(), 300, NOW).unwrap_err();
        assert!(matches!(err, VerificationError::MissingOrMalformedHeader));
    }

    #[test]
    fn test_verify_empty_header() {
        let err = verify_at(PAYLOAD, Some(""), &secret(), 300, NOW).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureMismatch(_)));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let header = signature_header(PAYLOAD, &Secret::new("whsec_other"), NOW).unwrap();
        let err = verify_at(PAYLOAD, Some(&header), &secret(), 300, NOW).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureMismatch(_)));
    }

    #[test]
    fn test_verify_tampered_payload() {
        let header = valid_header();
        let tampered = br#"{"type":"payment_intent.succeeded","data":{"id":"pi_999"}}"#;
        let err = verify_at(tampered, Some(&header), &secret(), 300, NOW).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureMismatch(_)));
    }

    #[test]
    fn test_flipping_any_header_byte_never_verifies() {
        let header = valid_header();

        for i in 0..header.len() {
            let mut bytes = header.clone().into_bytes();
            bytes[i] ^= 0x01;
            let Ok(flipped) = String::from_utf8(bytes) else {
                continue;
            };

            let result = verify_at(PAYLOAD, Some(&flipped), &secret(), 300, NOW);
            assert!(
                matches!(result, Err(VerificationError::SignatureMismatch(_))),
                "byte {} flipped: {:?}",
                i,
                result
            );
        }
    }

    #[test]
    fn test_verify_stale_timestamp() {
        let header = signature_header(PAYLOAD, &secret(), NOW - 301).unwrap();
        let err = verify_at(PAYLOAD, Some(&header), &secret(), 300, NOW).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureMismatch(_)));
    }

    #[test]
    fn test_verify_zero_tolerance_skips_age_check() {
        let header = signature_header(PAYLOAD, &secret(), 946_684_800).unwrap();
        assert!(verify_at(PAYLOAD, Some(&header), &secret(), 0, NOW).is_ok());
    }

    #[test]
    fn test_verify_any_v1_candidate() {
        let good = sign_payload(PAYLOAD, &secret(), NOW).unwrap();
        let header = format!("t={},v1={},v1={},v0=ignored", NOW, "0".repeat(64), good);

        assert!(verify_at(PAYLOAD, Some(&header), &secret(), 300, NOW).is_ok());
    }

    #[test]
    fn test_verify_v0_only_is_rejected() {
        let good = sign_payload(PAYLOAD, &secret(), NOW).unwrap();
        let header = format!("t={},v0={}", NOW, good);

        let err = verify_at(PAYLOAD, Some(&header), &secret(), 300, NOW).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureMismatch(_)));
    }

    #[test]
    fn test_verify_malformed_payload() {
        let payload = b"not json at all";
        let header = signature_header(payload, &secret(), NOW).unwrap();

        let err = verify_at(payload, Some(&header), &secret(), 300, NOW).unwrap_err();
        assert!(matches!(err, VerificationError::MalformedPayload(_)));
    }

    #[test]
    fn test_verify_invalid_utf8_payload() {
        let payload = b"{\"type\":\"\xff\",\"data\":{}}";
        let header = signature_header(payload, &secret(), NOW).unwrap();

        let err = verify_at(payload, Some(&header), &secret(), 300, NOW).unwrap_err();
        assert!(matches!(err, VerificationError::MalformedPayload(_)));
    }

    #[test]
    fn test_unsigned_garbage_is_signature_mismatch() {
        let err = verify_at(b"garbage", Some("t=1,v1=abc"), &secret(), 300, NOW).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureMismatch(_)));
    }

    #[test]
    fn test_verify_empty_secret() {
        let header = valid_header();
        let err = verify_at(PAYLOAD, Some(&header), &Secret::new(""), 300, NOW).unwrap_err();

        assert!(matches!(
            err,
            VerificationError::UnexpectedVerificationFailure(_)
        ));
    }

    #[test]
    fn test_errors_never_contain_secret() {
        let header = signature_header(PAYLOAD, &Secret::new("whsec_other"), NOW).unwrap();
        let err = verify_at(PAYLOAD, Some(&header), &secret(), 300, NOW).unwrap_err();

        assert!(!err.to_string().contains("whsec_test_secret"));
        assert!(!format!("{:?}", err).contains("whsec_test_secret"));
    }

    #[test]
    fn test_parse_header() {
        let parsed = ParsedHeader::parse("t=123,v1=abc,v1=def,v0=xyz,extra").unwrap();
        assert_eq!(parsed.timestamp, 123);
        assert_eq!(parsed.signatures, vec!["abc", "def"]);

        assert!(ParsedHeader::parse("").is_none());
        assert!(ParsedHeader::parse("t=123").is_none());
        assert!(ParsedHeader::parse("v1=abc").is_none());
        assert!(ParsedHeader::parse("t=soon,v1=abc").is_none());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
        assert!(!constant_time_compare("", "a"));
        assert!(constant_time_compare("", ""));
    }
}
