//! Where authorization state comes from

use crate::config::StoreConfig;
use crate::error::{FetchError, Result};
use crate::snapshot::AuthorizationSnapshot;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, COOKIE};
use reqwest::Url;
use tracing::debug;

/// A provider of the current session's authorization data
#[async_trait]
pub trait AuthorizationSource: Send + Sync {
    /// Fetch the current snapshot
    async fn fetch(&self) -> Result<AuthorizationSnapshot>;
}

/// Fetches `GET {server_url}/api/me` with the session's credentials
#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: Url,
    cookie: Option<HeaderValue>,
}

impl HttpSource {
    /// Build a source from the store configuration
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let url = Url::parse(&config.endpoint_url())
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let cookie = config
            .session_cookie
            .as_deref()
            .map(HeaderValue::from_str)
            .transpose()
            .map_err(|e| FetchError::InvalidUrl(format!("invalid session cookie: {}", e)))?;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, url, cookie })
    }

    /// Endpoint this source fetches from
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl AuthorizationSource for HttpSource {
    async fn fetch(&self) -> Result<AuthorizationSnapshot> {
        let mut request = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json");
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        debug!(url = %self.url, bytes = body.len(), "Fetched authorization state");

        AuthorizationSnapshot::from_slice(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_source_endpoint() {
        let source = HttpSource::new(&StoreConfig::new("http://localhost:3000")).unwrap();
        assert_eq!(source.url().as_str(), "http://localhost:3000/api/me");
    }

    #[test]
    fn test_http_source_rejects_bad_url() {
        let result = HttpSource::new(&StoreConfig::new("not a url"));
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_http_source_rejects_bad_cookie() {
        let config = StoreConfig::new("http://localhost:3000").session_cookie("sid=a\nb");
        let result = HttpSource::new(&config);
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_http_source_unreachable_is_network_error() {
        // Port 9 (discard) on loopback is not expected to be listening
        let config = StoreConfig::new("http://127.0.0.1:9")
            .request_timeout(std::time::Duration::from_secs(2));
        let source = HttpSource::new(&config).unwrap();

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_) | FetchError::Timeout));
    }
}
