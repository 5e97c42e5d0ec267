//! Fetcher system for retrieving pages
//!
//! The crawler only talks to the [`Fetcher`] trait, so the transport can be
//! swapped out (in tests, for an in-memory site). [`HttpFetcher`] is the
//! real implementation built on reqwest.

mod http;

pub use http::HttpFetcher;

use crate::types::FetchOutcome;
use async_trait::async_trait;
use url::Url;

/// Trait for page fetchers
///
/// A fetcher turns a URL into either a [`FetchedPage`](crate::FetchedPage)
/// holding an HTML body or a [`FetchError`](crate::FetchError) explaining
/// why the URL cannot be used. It must never panic on network or content
/// problems; every failure is a value the crawler can record.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Unique identifier for this fetcher (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Fetch the page at `url`
    async fn fetch(&self, url: &Url) -> FetchOutcome;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn fetch(&self, url: &Url) -> FetchOutcome {
        (**self).fetch(url).await
    }
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for std::sync::Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn fetch(&self, url: &Url) -> FetchOutcome {
        (**self).fetch(url).await
    }
}
