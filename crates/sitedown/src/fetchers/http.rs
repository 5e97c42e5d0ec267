//! HTTP fetcher
//!
//! Performs GET requests with reqwest and accepts only successful HTML
//! responses. Binary content types are rejected from the headers alone,
//! before any body bytes are read. Bodies are decoded with the charset
//! declared in `Content-Type`, falling back to UTF-8.

use crate::client::FetchOptions;
use crate::convert::is_html;
use crate::error::FetchError;
use crate::fetchers::Fetcher;
use crate::types::{FetchOutcome, FetchedPage};
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Binary content type prefixes
const BINARY_PREFIXES: &[&str] = &[
    "image/",
    "audio/",
    "video/",
    "application/octet-stream",
    "application/pdf",
    "application/zip",
    "application/gzip",
    "application/x-tar",
    "application/x-rar",
    "application/x-7z",
    "application/vnd.ms-",
    "application/vnd.openxmlformats",
    "font/",
];

/// Accept header sent with every request
const ACCEPT_HTML: &str = "text/html, application/xhtml+xml;q=0.9, */*;q=0.5";

/// HTTP/HTTPS page fetcher
///
/// Holds one reqwest client for the whole crawl so connections are pooled
/// across pages.
pub struct HttpFetcher {
    client: reqwest::Client,
    body_timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with default options
    pub fn new() -> Result<Self, FetchError> {
        Self::with_options(&FetchOptions::default())
    }

    /// Create a fetcher with custom options
    pub fn with_options(options: &FetchOptions) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let user_agent = options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(options.connect_timeout)
            .read_timeout(options.read_timeout)
            .build()
            .map_err(FetchError::ClientBuildError)?;

        Ok(Self {
            client,
            body_timeout: options.body_timeout,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &Url) -> FetchOutcome {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(ref ct) = content_type {
            if is_binary_content_type(ct) {
                debug!(url = %url, content_type = %ct, "Skipping binary response");
                return Err(FetchError::NotHtml(content_type));
            }
        }

        let body = read_text_with_timeout(response, self.body_timeout).await?;

        if !accepts_as_html(&content_type, &body) {
            return Err(FetchError::NotHtml(content_type));
        }

        Ok(FetchedPage {
            final_url: Some(final_url),
            status_code: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Check if content type indicates binary content
fn is_binary_content_type(content_type: &str) -> bool {
    let ct_lower = content_type.to_lowercase();
    BINARY_PREFIXES
        .iter()
        .any(|prefix| ct_lower.starts_with(prefix))
}

/// Decide whether a response counts as an HTML page
///
/// A declared HTML type is trusted. Body sniffing is only used when the
/// header is missing or the generic `text/plain` that misconfigured
/// servers send for everything.
fn accepts_as_html(content_type: &Option<String>, body: &str) -> bool {
    match content_type {
        Some(ct) if !ct.to_lowercase().starts_with("text/plain") => is_html(content_type, ""),
        _ => is_html(content_type, body),
    }
}

/// Read and decode the response body, failing if it takes longer than `timeout`
async fn read_text_with_timeout(
    response: reqwest::Response,
    timeout: Duration,
) -> Result<String, FetchError> {
    match tokio::time::timeout(timeout, response.text()).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            warn!("Error reading body: {}", e);
            Err(FetchError::from_reqwest(e))
        }
        Err(_) => {
            warn!("Body timeout reached after {:?}", timeout);
            Err(FetchError::Timeout)
        }
    }
}
