//! HuobiHadax request signing (signature version 2)
//!
//! The query string (auth parameters plus any request parameters) is sorted by key,
//! URL-encoded and signed together with method, host and path:
//! `base64(HMAC-SHA256(secret, "METHOD\nhost\npath\nquery"))`.

use crate::config::Credentials;
use crate::errors::{ExchangeError, Result};
use crate::http::HttpRequest;
use crate::traits::RequestSigner;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::trace;

type HmacSha256 = Hmac<Sha256>;

pub struct HuobiSigner {
    credentials: Credentials,
}

impl HuobiSigner {
    pub fn new(credentials: Credentials) -> Result<Self> {
        if !credentials.is_complete() {
            return Err(ExchangeError::MissingCredentials("huobi api key and secret".to_string()));
        }
        Ok(Self { credentials })
    }

    fn signature(&self, payload: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.credentials.api_secret.as_bytes())
            .map_err(|e| ExchangeError::Signing(format!("HMAC setup failed: {e}")))?;
        mac.update(payload.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Sign with an explicit timestamp (`%Y-%m-%dT%H:%M:%S`, UTC)
    pub fn sign_at(&self, request: &mut HttpRequest, timestamp: &str) -> Result<()> {
        let mut params: Vec<(String, String)> = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.push(("AccessKeyId".into(), self.credentials.api_key.clone()));
        params.push(("SignatureMethod".into(), "HmacSHA256".into()));
        params.push(("SignatureVersion".into(), "2".into()));
        params.push(("Timestamp".into(), timestamp.to_string()));
        params.sort();

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let host = request
            .url
            .host_str()
            .ok_or_else(|| ExchangeError::InvalidUrl("No host in URL".to_string()))?
            .to_lowercase();
        let payload = format!("{}\n{}\n{}\n{}", request.method, host, request.url.path(), query);
        let signature = self.signature(&payload)?;

        let signed = format!("{query}&Signature={}", urlencoding::encode(&signature));
        request.url.set_query(Some(&signed));
        trace!("🔐 signed {} {}", request.method, request.url.path());
        Ok(())
    }
}

impl RequestSigner for HuobiSigner {
    fn sign(&self, request: &mut HttpRequest) -> Result<()> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        self.sign_at(request, &timestamp)
    }
}
