use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::config::ConfigError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signature header")]
    MissingHeader,

    #[error("malformed signature header")]
    MalformedHeader,

    #[error("no signature matches the payload")]
    NoMatchingSignature,

    #[error("signature timestamp is outside the tolerance window")]
    TimestampOutsideTolerance,
}

/// Verifies `t=<unix>,v1=<hex>` signature headers: HMAC-SHA256 over
/// `"{t}.{body}"` keyed with the endpoint signing secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    pub fn new(secret: &str, tolerance_secs: i64) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::Missing(vec!["STRIPE_WEBHOOK_SECRET"]));
        }
        Ok(Self {
            secret: secret.to_string(),
            tolerance_secs,
        })
    }

    pub fn verify(
        &self,
        payload: &[u8],
        header: Option<&str>,
        now_unix: i64,
    ) -> Result<(), SignatureError> {
        let header = header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(SignatureError::MissingHeader)?;

        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<&str> = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse().ok(),
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
        if candidates.is_empty() {
            return Err(SignatureError::MalformedHeader);
        }

        if now_unix.abs_diff(timestamp) > self.tolerance_secs.unsigned_abs() {
            return Err(SignatureError::TimestampOutsideTolerance);
        }

        let matched = candidates.into_iter().any(|candidate| {
            let Ok(expected) = hex::decode(candidate) else {
                return false;
            };
            // verify_slice compares in constant time.
            self.mac_for(timestamp, payload)
                .map(|mac| mac.verify_slice(&expected).is_ok())
                .unwrap_or(false)
        });

        if matched {
            Ok(())
        } else {
            Err(SignatureError::NoMatchingSignature)
        }
    }

    /// Header value a provider would send for `payload` at `timestamp`.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let digest = self
            .mac_for(timestamp, payload)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default();
        format!("t={timestamp},v1={digest}")
    }

    fn mac_for(&self, timestamp: i64, payload: &[u8]) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Some(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test123secret456";
    const PAYLOAD: &[u8] = br#"{"type":"checkout.session.completed"}"#;
    const NOW: i64 = 1_750_000_000;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(SECRET, 300).unwrap()
    }

    #[test]
    fn accepts_own_signature() {
        let header = verifier().sign(PAYLOAD, NOW);
        assert_eq!(verifier().verify(PAYLOAD, Some(&header), NOW + 10), Ok(()));
    }

    #[test]
    fn accepts_when_any_v1_matches() {
        let signed = verifier().sign(PAYLOAD, NOW);
        let digest = signed.split("v1=").nth(1).unwrap();
        let header = format!("t={NOW},v1={},v1={digest}", "ab".repeat(32));
        assert_eq!(verifier().verify(PAYLOAD, Some(&header), NOW), Ok(()));
    }

    #[test]
    fn rejects_tampered_payload() {
        let header = verifier().sign(PAYLOAD, NOW);
        let tampered = br#"{"type":"checkout.session.completed","x":1}"#;
        assert_eq!(
            verifier().verify(tampered, Some(&header), NOW),
            Err(SignatureError::NoMatchingSignature)
        );
    }

    #[test]
    fn rejects_other_secret() {
        let other = WebhookVerifier::new("whsec_other", 300).unwrap();
        let header = other.sign(PAYLOAD, NOW);
        assert_eq!(
            verifier().verify(PAYLOAD, Some(&header), NOW),
            Err(SignatureError::NoMatchingSignature)
        );
    }

    #[test]
    fn rejects_stale_timestamp() {
        let header = verifier().sign(PAYLOAD, NOW - 600);
        assert_eq!(
            verifier().verify(PAYLOAD, Some(&header), NOW),
            Err(SignatureError::TimestampOutsideTolerance)
        );
    }

    #[test]
    fn rejects_extreme_timestamps() {
        let v = verifier();
        for header in [
            "t=-9223372036854775808,v1=00",
            "t=9223372036854775807,v1=00",
        ] {
            assert_eq!(
                v.verify(b"{}", Some(header), NOW),
                Err(SignatureError::TimestampOutsideTolerance)
            );
        }
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        let v = verifier();
        assert_eq!(v.verify(PAYLOAD, None, NOW), Err(SignatureError::MissingHeader));
        assert_eq!(v.verify(PAYLOAD, Some("  "), NOW), Err(SignatureError::MissingHeader));
        assert_eq!(
            v.verify(PAYLOAD, Some("v1=abcd"), NOW),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            v.verify(PAYLOAD, Some(&format!("t={NOW}")), NOW),
            Err(SignatureError::MalformedHeader)
        );
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        assert!(WebhookVerifier::new("", 300).is_err());
    }
}
