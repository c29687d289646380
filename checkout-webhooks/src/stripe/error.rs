//! Verification failure taxonomy.

use thiserror::Error;

/// Reasons a webhook request fails verification.
///
/// Every variant maps to the same 400 response; the distinction only shows up
/// in logs. Messages never include the signing secret.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The signature header is absent or not readable as text.
    #[error("missing or unreadable Stripe-Signature header")]
    MissingOrMalformedHeader,

    /// The signed body is not a valid event envelope.
    #[error("malformed event payload: {0}")]
    MalformedPayload(String),

    /// No usable signature in the header matched the payload.
    #[error("signature mismatch: {0}")]
    SignatureMismatch(&'static str),

    /// Anything else that went wrong while verifying.
    #[error("unexpected verification failure: {0}")]
    UnexpectedVerificationFailure(String),
}

impl VerificationError {
    /// Stable identifier used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            VerificationError::MissingOrMalformedHeader => "missing_or_malformed_header",
            VerificationError::MalformedPayload(_) => "malformed_payload",
            VerificationError::SignatureMismatch(_) => "signature_mismatch",
            VerificationError::UnexpectedVerificationFailure(_) => {
                "unexpected_verification_failure"
            }
        }
    }
}

impl From<serde_json::Error> for VerificationError {
    fn from(err: serde_json::Error) -> Self {
        VerificationError::MalformedPayload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let kinds = [
            VerificationError::MissingOrMalformedHeader.kind(),
            VerificationError::MalformedPayload("x".into()).kind(),
            VerificationError::SignatureMismatch("x").kind(),
            VerificationError::UnexpectedVerificationFailure("x".into()).kind(),
        ];

        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_json_error_is_malformed_payload() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            VerificationError::from(err),
            VerificationError::MalformedPayload(_)
        ));
    }
}
