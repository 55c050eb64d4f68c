use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};

/// The header name or value handed to [`ApiKey::new`] is not valid HTTP.
#[derive(Debug, thiserror::Error)]
pub enum InvalidCredential {
    #[error("invalid header name: {0}")]
    Name(#[from] InvalidHeaderName),
    #[error("invalid header value: {0}")]
    Value(#[from] InvalidHeaderValue),
}

/// An [`HttpClient`] wrapper that injects a credential as an HTTP header.
///
/// Used for the SBC session token, which is sent back in the same custom
/// header it was issued in. The value is marked sensitive so it is redacted
/// from `Debug` output.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self, InvalidCredential> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())?;
        let mut key = HeaderValue::from_str(key)?;
        key.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            key,
        })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_header_name() {
        let result = ApiKey::new((), "bad header", "token");
        assert!(matches!(result, Err(InvalidCredential::Name(_))));
    }

    #[test]
    fn test_rejects_invalid_header_value() {
        let result = ApiKey::new((), "x-sbc-auth", "line\nbreak");
        assert!(matches!(result, Err(InvalidCredential::Value(_))));
    }

    #[test]
    fn test_value_is_sensitive() {
        let auth = ApiKey::new((), "x-sbc-auth", "secret").unwrap();
        assert!(auth.key.is_sensitive());
        assert_eq!(auth.header_name.as_str(), "x-sbc-auth");
    }
}
