//! `X-Hub-Signature-256` verification.

use ring::hmac;
use tracing::warn;

use crate::WebhookError;

const PREFIX: &str = "sha256=";

/// Verifies HMAC-SHA256 webhook signatures against a shared secret.
///
/// Built without a secret, every request is accepted.
pub struct SignatureVerifier {
    key: Option<hmac::Key>,
}

impl SignatureVerifier {
    pub fn new(secret: Option<&str>) -> Self {
        let key = secret
            .filter(|s| !s.is_empty())
            .map(|s| hmac::Key::new(hmac::HMAC_SHA256, s.as_bytes()));
        if key.is_none() {
            warn!("no webhook secret configured, signature verification is disabled");
        }
        Self { key }
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// Checks `header` (the raw `X-Hub-Signature-256` value) against `body`.
    ///
    /// The comparison is constant-time.
    pub fn verify(&self, header: Option<&str>, body: &[u8]) -> Result<(), WebhookError> {
        let Some(key) = &self.key else {
            return Ok(());
        };
        let header = header.ok_or(WebhookError::MissingHeader("x-hub-signature-256"))?;
        let tag = header
            .strip_prefix(PREFIX)
            .and_then(|hex_tag| hex::decode(hex_tag).ok())
            .ok_or(WebhookError::InvalidSignature)?;
        hmac::verify(key, body, &tag).map_err(|_| WebhookError::InvalidSignature)
    }
}

/// Computes the `X-Hub-Signature-256` value GitHub sends for `body`.
pub fn signature_header(secret: &str, body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    format!("{PREFIX}{}", hex::encode(hmac::sign(&key, body).as_ref()))
}
