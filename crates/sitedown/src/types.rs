//! Core types for SiteDown

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use url::Url;

/// A successfully fetched page, ready for aggregation
///
/// Created by the crawler and never modified afterwards. `order` is the
/// zero-based position of the page in the final document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Normalized URL the page was requested under
    pub url: Url,

    /// Raw response body
    pub html: String,

    /// Sequence index assigned when the page was accepted
    pub order: usize,
}

/// Response data returned by a [`Fetcher`](crate::Fetcher) on success
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// URL after following redirects
    pub final_url: Option<Url>,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Decoded response body
    pub body: String,
}

impl FetchedPage {
    /// Create a page with a body and no metadata
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
            ..Default::default()
        }
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the final URL after redirects
    pub fn with_final_url(mut self, url: Url) -> Self {
        self.final_url = Some(url);
        self
    }
}

/// Result of fetching one URL
pub type FetchOutcome = Result<FetchedPage, FetchError>;

/// A URL that could not be turned into a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPage {
    /// Normalized URL that failed
    pub url: Url,

    /// Human-readable failure reason
    pub reason: String,
}

/// How a crawl ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    /// Frontier exhausted
    #[default]
    Complete,
    /// Stopped early by cancellation; output is partial
    Cancelled,
}

impl std::fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrawlStatus::Complete => write!(f, "complete"),
            CrawlStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Everything a crawl produced
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Accepted pages in ascending `order`
    pub pages: Vec<PageRecord>,

    /// Pages that failed, in the order they were attempted
    pub failures: Vec<FailedPage>,

    /// Terminal state of the crawl
    pub status: CrawlStatus,
}

impl CrawlReport {
    /// URLs of accepted pages in document order
    pub fn urls(&self) -> Vec<&str> {
        self.pages.iter().map(|p| p.url.as_str()).collect()
    }

    /// Body-free summary suitable for serialization
    pub fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            status: self.status,
            pages: self
                .pages
                .iter()
                .map(|p| PageSummary {
                    url: p.url.clone(),
                    order: p.order,
                    size: p.html.len(),
                })
                .collect(),
            failures: self.failures.clone(),
        }
    }
}

/// Serializable crawl summary without page bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// Terminal state of the crawl
    pub status: CrawlStatus,

    /// Accepted pages
    pub pages: Vec<PageSummary>,

    /// Failed pages
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<FailedPage>,
}

/// One accepted page in a [`CrawlSummary`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: Url,
    pub order: usize,
    /// Body size in bytes
    pub size: usize,
}
