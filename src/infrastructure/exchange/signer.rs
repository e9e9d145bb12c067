// src/infrastructure/exchange/signer.rs
// OKX v5 request signing

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::errors::{ExchangeError, ExchangeResult};

type HmacSha256 = Hmac<Sha256>;

/// Signs `timestamp + METHOD + requestPath + body` with the API secret
#[derive(Clone)]
pub struct RequestSigner {
    secret: String,
}

impl RequestSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// `path` includes the query string for GET requests
    pub fn sign(&self, timestamp: &str, method: &str, path: &str, body: &str) -> ExchangeResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| ExchangeError::Authentication(format!("invalid secret: {}", e)))?;
        mac.update(timestamp.as_bytes());
        mac.update(method.to_uppercase().as_bytes());
        mac.update(path.as_bytes());
        mac.update(body.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner").field("secret", &"***").finish()
    }
}

/// ISO-8601 with millisecond precision, e.g. `2020-12-08T09:08:57.715Z`
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
