use chrono::{DateTime, Duration, Utc};

use hmac::{Hmac, Mac};

use secrecy::Secret;

use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the processor's event signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Events older than this are rejected even with a valid signature,
/// bounding the replay window.
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Verifies processor event signatures of the form `t=<unix>,v1=<hex>`,
/// where the hex digest is HMAC-SHA256 over `"{t}.{payload}"` keyed by
/// the shared webhook signing secret.
///
/// Verification fails closed: any parse failure, stale timestamp, or
/// digest mismatch rejects the event before it causes any state change.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Secret<String>,
    tolerance: Duration,
}

impl WebhookVerifier {
    pub fn new(secret: Secret<String>) -> Self {
        Self {
            secret,
            tolerance: Duration::seconds(TIMESTAMP_TOLERANCE_SECS),
        }
    }

    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<()> {
        self.verify_at(payload, signature_header, Utc::now())
    }

    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        use secrecy::ExposeSecret;

        let (timestamp, signatures) = parse_signature_header(signature_header)?;

        let age = now.timestamp() - timestamp;
        if age.abs() > self.tolerance.num_seconds() {
            return Err(Error::SignatureVerification(
                "Event timestamp outside tolerance".into(),
            ));
        }

        let mut signed_payload = format!("{}.", timestamp).into_bytes();
        signed_payload.extend_from_slice(payload);

        for candidate in &signatures {
            let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
                .map_err(|_| Error::SignatureVerification("Invalid signing secret".into()))?;
            mac.update(&signed_payload);
            // Constant-time comparison via the Mac verifier.
            if mac.verify_slice(candidate).is_ok() {
                return Ok(());
            }
        }

        Err(Error::SignatureVerification("No matching signature".into()))
    }
}

fn parse_signature_header(header: &str) -> Result<(i64, Vec<Vec<u8>>)> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    Error::SignatureVerification("Malformed timestamp".into())
                })?);
            }
            "v1" => {
                let raw = hex::decode(value).map_err(|_| {
                    Error::SignatureVerification("Malformed signature hex".into())
                })?;
                signatures.push(raw);
            }
            // Unknown schemes (v0 etc.) are ignored.
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| Error::SignatureVerification("Missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(Error::SignatureVerification("Missing v1 signature".into()));
    }

    Ok((timestamp, signatures))
}

/// Compute the `t=..,v1=..` header value for a payload. The server only
/// verifies; this exists for tests and local tooling.
pub fn sign_payload(secret: &Secret<String>, payload: &[u8], timestamp: i64) -> String {
    use secrecy::ExposeSecret;

    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts keys of any size");
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    let digest = hex::encode(mac.finalize().into_bytes());

    format!("t={},v1={}", timestamp, digest)
}
