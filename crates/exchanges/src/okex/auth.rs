//! OKEx v3 request signing
//!
//! `OK-ACCESS-SIGN = base64(HMAC-SHA256(secret, timestamp + METHOD + path?query + body))`,
//! with the timestamp in ISO-8601 UTC with milliseconds.

use crate::config::Credentials;
use crate::errors::{ExchangeError, Result};
use crate::http::HttpRequest;
use crate::traits::RequestSigner;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub struct OkexSigner {
    api_key: String,
    api_secret: String,
    passphrase: String,
}

impl OkexSigner {
    /// OKEx keys are bound to a passphrase; all three are required
    pub fn new(credentials: Credentials) -> Result<Self> {
        if !credentials.is_complete() {
            return Err(ExchangeError::MissingCredentials("okex api key and secret".to_string()));
        }
        let passphrase = credentials
            .passphrase
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ExchangeError::MissingCredentials("okex api passphrase".to_string()))?;

        Ok(Self {
            api_key: credentials.api_key,
            api_secret: credentials.api_secret,
            passphrase,
        })
    }

    pub fn sign_at(&self, request: &mut HttpRequest, timestamp: &str) -> Result<()> {
        let prehash = format!(
            "{}{}{}{}",
            timestamp,
            request.method,
            request.path_and_query(),
            request.body.as_deref().unwrap_or_default()
        );

        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| ExchangeError::Signing(format!("HMAC setup failed: {e}")))?;
        mac.update(prehash.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        request.set_header("OK-ACCESS-KEY", self.api_key.clone());
        request.set_header("OK-ACCESS-SIGN", signature);
        request.set_header("OK-ACCESS-TIMESTAMP", timestamp);
        request.set_header("OK-ACCESS-PASSPHRASE", self.passphrase.clone());
        Ok(())
    }
}

impl RequestSigner for OkexSigner {
    fn sign(&self, request: &mut HttpRequest) -> Result<()> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
        self.sign_at(request, &timestamp)
    }
}
