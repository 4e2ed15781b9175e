//! Network access for the fetch policy.
//!
//! The policy only sees the [`Network`] trait so tests can drive it without
//! sockets. [`HttpNetwork`] is the real implementation on top of reqwest.
//!
//! ### Semantics
//! - HTTP error statuses (404, 500, ...) are responses, not failures.
//! - Only transport failures (DNS, connect, timeout, body read) are errors.
//! - Max redirects: 5
//! - Max body bytes: configurable, larger bodies are a failure

use std::time::{Duration, Instant};

use async_trait::async_trait;
use nai_core::{AppConfig, Error};
use reqwest::Client;
use url::Url;

use super::request::{Request, Response, ResponseType};

/// Anything that can turn a request into a response.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for [`HttpNetwork`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// User agent string (default: "nai-site/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for HttpConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: 5,
        }
    }
}

/// reqwest-backed network.
pub struct HttpNetwork {
    http: Client,
    config: HttpConfig,
}

impl HttpNetwork {
    pub fn new(config: HttpConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn too_large(&self, len: usize) -> Error {
        Error::Network(format!("{len} bytes exceeds {}", self.config.max_bytes))
    }
}

/// `basic` when the response stayed on the request's origin, `cors` otherwise.
pub fn response_type_for(request_url: &Url, final_url: &Url) -> ResponseType {
    if request_url.origin() == final_url.origin() { ResponseType::Basic } else { ResponseType::Cors }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(|e| Error::Network(format!("{}: {e}", request.url)))?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(self.too_large(len as usize));
        }

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {e}")))?;

        if body.len() > self.config.max_bytes {
            return Err(self.too_large(body.len()));
        }

        tracing::debug!(
            "fetched {} {} -> {} {} in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response {
            response_type: response_type_for(&request.url, &final_url),
            url: final_url,
            status,
            headers,
            body,
        })
    }
}
