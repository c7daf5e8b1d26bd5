//! Remote resource access
//!
//! [`ResourceSource`] is the seam between the rewriter and the network.
//! [`HttpSource`] is the reqwest-backed implementation: a `HEAD` request
//! for probing and a streamed `GET` for downloading, each with its own
//! deadline.

use crate::error::FetchError;
use crate::probe::classify;
use crate::types::ProbeResult;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default deadline for the metadata request
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default deadline for the full download
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum redirects followed by either request
const MAX_REDIRECTS: usize = 10;

/// Access to remote resources
///
/// Implementations must not fail the whole run: probe problems are
/// reported as [`ProbeResult::Ineligible`], download problems as
/// [`FetchError`].
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &'static str;

    /// Metadata-only eligibility check
    async fn probe(&self, url: &str) -> ProbeResult;

    /// Retrieve the full body
    async fn download(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// Builder for [`HttpSource`]
#[derive(Debug, Clone)]
pub struct HttpSourceBuilder {
    user_agent: Option<String>,
    probe_timeout: Duration,
    fetch_timeout: Duration,
}

impl Default for HttpSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpSourceBuilder {
    /// Create a builder with default timeouts
    pub fn new() -> Self {
        Self {
            user_agent: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set the probe deadline
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set the download deadline
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Build the source
    pub fn build(self) -> Result<HttpSource, FetchError> {
        let user_agent = self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let user_agent = HeaderValue::from_str(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT));

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(USER_AGENT, user_agent);
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .connect_timeout(self.probe_timeout.min(self.fetch_timeout))
            .build()
            .map_err(FetchError::ClientBuildError)?;

        Ok(HttpSource {
            client,
            probe_timeout: self.probe_timeout,
            fetch_timeout: self.fetch_timeout,
        })
    }
}

/// HTTP implementation of [`ResourceSource`]
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    probe_timeout: Duration,
    fetch_timeout: Duration,
}

impl HttpSource {
    /// Create a source with default settings
    pub fn new() -> Result<Self, FetchError> {
        HttpSourceBuilder::new().build()
    }

    /// Create a builder
    pub fn builder() -> HttpSourceBuilder {
        HttpSourceBuilder::new()
    }
}

/// Parse and check the scheme before any I/O
fn validate_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(FetchError::InvalidUrl),
    }
}

#[async_trait]
impl ResourceSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn probe(&self, url: &str) -> ProbeResult {
        let parsed = match validate_url(url) {
            Ok(parsed) => parsed,
            Err(e) => return ProbeResult::ineligible(e.to_string()),
        };

        let response = match self
            .client
            .head(parsed)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let err = FetchError::from_reqwest(e, self.probe_timeout);
                return ProbeResult::ineligible(err.to_string());
            }
        };

        let status = response.status().as_u16();
        let content_type = response.headers().get(CONTENT_TYPE).map(header_text);

        debug!(url, status, content_type = ?content_type, "Probe response");
        classify(status, content_type.as_deref())
    }

    async fn download(&self, url: &str) -> Result<Bytes, FetchError> {
        let parsed = validate_url(url)?;
        let timeout = self.fetch_timeout;
        let deadline = tokio::time::Instant::now() + self.fetch_timeout;

        let response = tokio::time::timeout_at(deadline, self.client.get(parsed).send())
            .await
            .map_err(|_| FetchError::Timeout(timeout))?
            .map_err(|e| FetchError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        read_body_with_deadline(response, deadline, timeout).await
    }
}

/// Header value as text; bytes outside visible ASCII become U+FFFD
fn header_text(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

/// Read the whole body or fail; a partial body is never returned
async fn read_body_with_deadline(
    response: reqwest::Response,
    deadline: tokio::time::Instant,
    timeout: Duration,
) -> Result<Bytes, FetchError> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    loop {
        tokio::select! {
            chunk = stream.next() => {
                match chunk {
                    Some(Ok(bytes)) => body.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        warn!("Error reading body chunk: {}", e);
                        return Err(FetchError::from_reqwest(e, timeout));
                    }
                    None => return Ok(Bytes::from(body)),
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                warn!(received = body.len(), "Body timeout reached, discarding partial content");
                return Err(FetchError::Timeout(timeout));
            }
        }
    }
}
