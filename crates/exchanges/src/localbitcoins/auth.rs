//! LocalBitcoins HMAC authentication
//!
//! `Apiauth-Signature = HEX_UPPER(HMAC-SHA256(secret, nonce + key + path + params))` where
//! params is the URL-encoded query (GET) or form body (POST).

use crate::config::Credentials;
use crate::errors::{ExchangeError, Result};
use crate::http::HttpRequest;
use crate::traits::RequestSigner;
use hmac::{Hmac, Mac};
use multivenue_core::next_nonce;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub struct LocalBitcoinsSigner {
    credentials: Credentials,
}

impl LocalBitcoinsSigner {
    pub fn new(credentials: Credentials) -> Result<Self> {
        if !credentials.is_complete() {
            return Err(ExchangeError::MissingCredentials("localbitcoins hmac key and secret".to_string()));
        }
        Ok(Self { credentials })
    }

    pub fn sign_with_nonce(&self, request: &mut HttpRequest, nonce: u64) -> Result<()> {
        let params = match &request.body {
            Some(body) => body.clone(),
            None => request.url.query().unwrap_or_default().to_string(),
        };
        let message = format!("{}{}{}{}", nonce, self.credentials.api_key, request.url.path(), params);

        let mut mac = HmacSha256::new_from_slice(self.credentials.api_secret.as_bytes())
            .map_err(|e| ExchangeError::Signing(format!("HMAC setup failed: {e}")))?;
        mac.update(message.as_bytes());
        let signature = hex::encode_upper(mac.finalize().into_bytes());

        request.set_header("Apiauth-Key", self.credentials.api_key.clone());
        request.set_header("Apiauth-Nonce", nonce.to_string());
        request.set_header("Apiauth-Signature", signature);
        Ok(())
    }
}

impl RequestSigner for LocalBitcoinsSigner {
    fn sign(&self, request: &mut HttpRequest) -> Result<()> {
        self.sign_with_nonce(request, next_nonce())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn signer() -> LocalBitcoinsSigner {
        LocalBitcoinsSigner::new(Credentials::new("hmac-key", "hmac-secret")).unwrap()
    }

    #[test]
    fn test_headers_and_uppercase_hex() {
        let mut request = HttpRequest::get(Url::parse("https://localbitcoins.com/api/wallet/").unwrap());
        signer().sign_with_nonce(&mut request, 1_500_000_000_000_000).unwrap();

        assert_eq!(request.header("Apiauth-Key"), Some("hmac-key"));
        assert_eq!(request.header("Apiauth-Nonce"), Some("1500000000000000"));
        let signature = request.header("Apiauth-Signature").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_form_body_is_signed() {
        let url = Url::parse("https://localbitcoins.com/api/ad-create/").unwrap();
        let mut a = HttpRequest::post(url.clone()).with_form(&[("currency", "USD".to_string())]);
        let mut b = HttpRequest::post(url).with_form(&[("currency", "EUR".to_string())]);
        signer().sign_with_nonce(&mut a, 7).unwrap();
        signer().sign_with_nonce(&mut b, 7).unwrap();
        assert_ne!(a.header("Apiauth-Signature"), b.header("Apiauth-Signature"));
    }

    #[test]
    fn test_signing_twice_replaces_headers() {
        let mut request = HttpRequest::get(Url::parse("https://localbitcoins.com/api/ads/").unwrap());
        signer().sign_with_nonce(&mut request, 1).unwrap();
        signer().sign_with_nonce(&mut request, 2).unwrap();
        assert_eq!(request.headers.iter().filter(|(k, _)| k == "Apiauth-Nonce").count(), 1);
        assert_eq!(request.header("Apiauth-Nonce"), Some("2"));
    }
}
