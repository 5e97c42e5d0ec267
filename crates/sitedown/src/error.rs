//! Error types for SiteDown
//!
//! Two families are kept apart: [`FetchError`] describes why a single page
//! could not be fetched and never stops a crawl, while [`CrawlError`] is
//! fatal to the whole run.

use thiserror::Error;

/// Errors that can occur while fetching a single page
#[derive(Debug, Error)]
pub enum FetchError {
    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Request or body read exceeded its timeout
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Server answered with a non-2xx status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Response is not an HTML document
    #[error("Not HTML content: {}", .0.as_deref().unwrap_or("unknown content type"))]
    NotHtml(Option<String>),

    /// A redirect left the crawl scope
    #[error("Redirected out of scope to {0}")]
    RedirectOutOfScope(String),
}

impl FetchError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::ConnectError(err)
        } else {
            FetchError::RequestError(err.to_string())
        }
    }
}

/// Errors that abort a crawl run
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Seed URL is unusable as a crawl root
    #[error("Invalid seed URL: {0}")]
    InvalidSeed(String),

    /// HTTP client could not be constructed
    #[error("Failed to initialize fetcher")]
    ClientBuild(#[source] FetchError),

    /// Writing the aggregated document failed
    #[error("Failed to write output")]
    Output(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(FetchError::Timeout.to_string(), "Request timed out");
        assert_eq!(FetchError::Status(404).to_string(), "HTTP status 404");
        assert_eq!(
            FetchError::NotHtml(Some("image/png".to_string())).to_string(),
            "Not HTML content: image/png"
        );
        assert_eq!(
            FetchError::NotHtml(None).to_string(),
            "Not HTML content: unknown content type"
        );
        assert_eq!(
            FetchError::RedirectOutOfScope("https://other.com/".to_string()).to_string(),
            "Redirected out of scope to https://other.com/"
        );
        assert_eq!(
            CrawlError::InvalidSeed("ftp://x".to_string()).to_string(),
            "Invalid seed URL: ftp://x"
        );
    }

    #[test]
    fn test_output_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CrawlError::Output(io);
        assert_eq!(err.to_string(), "Failed to write output");
        assert!(err.source().is_some());
    }
}
