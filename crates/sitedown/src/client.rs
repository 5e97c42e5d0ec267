//! Entry points for crawling a site
//!
//! The functions here wire the default [`HttpFetcher`](crate::HttpFetcher)
//! into a [`Crawler`]. For a custom fetcher or concurrency, use
//! [`Crawler::builder`] directly.

use crate::crawler::Crawler;
use crate::error::CrawlError;
use crate::types::CrawlReport;
use std::time::Duration;

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default wait for response data (headers or the next body chunk)
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default upper bound for reading a whole response body
pub const DEFAULT_BODY_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP options for the default fetcher
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Custom User-Agent
    pub user_agent: Option<String>,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Idle timeout while waiting for response data
    pub read_timeout: Duration,
    /// Total timeout for reading the body
    pub body_timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            body_timeout: DEFAULT_BODY_TIMEOUT,
        }
    }
}

/// Crawl a site starting from `seed` with default options
pub async fn crawl(seed: &str) -> Result<CrawlReport, CrawlError> {
    crawl_with_options(seed, FetchOptions::default()).await
}

/// Crawl a site starting from `seed` with custom HTTP options
pub async fn crawl_with_options(
    seed: &str,
    options: FetchOptions,
) -> Result<CrawlReport, CrawlError> {
    let crawler = Crawler::builder().fetch_options(options).build()?;
    crawler.crawl(seed).await
}
