//! Breadth-first crawl engine
//!
//! All crawl state (scope, visited map, frontier, accepted pages) lives in one
//! [`CrawlState`] owned by the task driving the crawl. Fetches may run
//! concurrently, but they only produce outcomes; every state change happens
//! on the driving task after a batch resolves, in dequeue order. Page order
//! therefore follows discovery order and is the same for every concurrency
//! setting.
//!
//! The crawl ends when the frontier is empty. There is no depth or page
//! limit, so a site that generates endless distinct URLs is crawled until
//! it is cancelled.

use crate::client::FetchOptions;
use crate::error::{CrawlError, FetchError};
use crate::fetchers::{Fetcher, HttpFetcher};
use crate::links::extract_links;
use crate::scope::{normalize_absolute, Scope};
use crate::types::{CrawlReport, CrawlStatus, FailedPage, FetchOutcome, PageRecord};
use futures::future::join_all;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Lifecycle of a single URL inside a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlState {
    /// Discovered and waiting in the frontier
    Pending,
    /// Request in flight
    Fetching,
    /// Resolved without failure
    Done,
    /// Fetch failed
    Failed,
}

/// Options controlling crawl execution
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Maximum number of fetches in flight at once
    pub concurrency: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// Builder for configuring a [`Crawler`]
#[derive(Default)]
pub struct CrawlerBuilder {
    fetch_options: FetchOptions,
    concurrency: Option<usize>,
    fetcher: Option<Box<dyn Fetcher>>,
}

impl CrawlerBuilder {
    /// Create a new builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all HTTP options at once
    pub fn fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.fetch_options.user_agent = Some(ua.into());
        self
    }

    /// Set connect and read timeouts
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.fetch_options.connect_timeout = timeout;
        self.fetch_options.read_timeout = timeout;
        self
    }

    /// Set total body read timeout
    pub fn body_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_options.body_timeout = timeout;
        self
    }

    /// Set maximum concurrent fetches (values below 1 are treated as 1)
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency.max(1));
        self
    }

    /// Use a custom fetcher instead of [`HttpFetcher`]
    ///
    /// HTTP options set on this builder are ignored when a fetcher is given.
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// Build the crawler
    pub fn build(self) -> Result<Crawler, CrawlError> {
        let fetcher: Box<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Box::new(
                HttpFetcher::with_options(&self.fetch_options).map_err(CrawlError::ClientBuild)?,
            ),
        };

        Ok(Crawler {
            fetcher,
            options: CrawlOptions {
                concurrency: self.concurrency.unwrap_or(1),
            },
        })
    }
}

/// Configured crawl engine
pub struct Crawler {
    fetcher: Box<dyn Fetcher>,
    options: CrawlOptions,
}

impl Crawler {
    /// Create a new crawler builder
    pub fn builder() -> CrawlerBuilder {
        CrawlerBuilder::new()
    }

    /// Create a sequential crawler around `fetcher`
    pub fn new(fetcher: impl Fetcher + 'static) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            options: CrawlOptions::default(),
        }
    }

    /// Crawl options in effect
    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Crawl every in-scope page reachable from `seed`
    pub async fn crawl(&self, seed: &str) -> Result<CrawlReport, CrawlError> {
        self.crawl_with_cancellation(seed, CancellationToken::new())
            .await
    }

    /// Crawl until the frontier is exhausted or `cancel` fires
    ///
    /// On cancellation, in-flight fetches are dropped and the report holds
    /// the pages accepted so far with status [`CrawlStatus::Cancelled`].
    pub async fn crawl_with_cancellation(
        &self,
        seed: &str,
        cancel: CancellationToken,
    ) -> Result<CrawlReport, CrawlError> {
        let mut state = CrawlState::new(Scope::from_seed(seed)?);

        info!(
            seed = %state.scope.seed(),
            fetcher = self.fetcher.name(),
            concurrency = self.options.concurrency,
            "Starting crawl"
        );

        let status = loop {
            if cancel.is_cancelled() {
                break CrawlStatus::Cancelled;
            }

            let batch = state.next_batch(self.options.concurrency);
            if batch.is_empty() {
                break CrawlStatus::Complete;
            }

            let fetches = join_all(batch.iter().map(|url| {
                debug!(url = %url, "Fetching");
                self.fetcher.fetch(url)
            }));

            let outcomes = tokio::select! {
                biased;
                _ = cancel.cancelled() => break CrawlStatus::Cancelled,
                outcomes = fetches => outcomes,
            };

            for (url, outcome) in batch.into_iter().zip(outcomes) {
                state.resolve(url, outcome);
            }
        };

        let report = state.into_report(status);
        info!(
            pages = report.pages.len(),
            failures = report.failures.len(),
            status = %report.status,
            "Crawl finished"
        );
        Ok(report)
    }
}

/// Scope, visited set, frontier and output of a running crawl
#[derive(Debug)]
struct CrawlState {
    scope: Scope,
    visited: HashMap<Url, UrlState>,
    frontier: VecDeque<Url>,
    pages: Vec<PageRecord>,
    failures: Vec<FailedPage>,
}

impl CrawlState {
    fn new(scope: Scope) -> Self {
        let seed = scope.seed().clone();
        let mut state = Self {
            scope,
            visited: HashMap::new(),
            frontier: VecDeque::new(),
            pages: Vec::new(),
            failures: Vec::new(),
        };
        state.discover(seed);
        state
    }

    /// Mark a normalized URL seen and enqueue it, unless it was seen before
    fn discover(&mut self, url: Url) -> bool {
        if self.visited.contains_key(&url) {
            return false;
        }
        self.visited.insert(url.clone(), UrlState::Pending);
        self.frontier.push_back(url);
        true
    }

    /// Dequeue up to `size` URLs and mark them in flight
    fn next_batch(&mut self, size: usize) -> Vec<Url> {
        let take = size.min(self.frontier.len());
        let batch: Vec<Url> = self.frontier.drain(..take).collect();
        for url in &batch {
            self.visited.insert(url.clone(), UrlState::Fetching);
        }
        batch
    }

    /// Apply the outcome of fetching `url`
    fn resolve(&mut self, url: Url, outcome: FetchOutcome) {
        let page = match outcome {
            Ok(page) => page,
            Err(err) => {
                self.fail(url, err);
                return;
            }
        };

        // Links resolve against where the server actually sent us
        let base = match page.final_url.and_then(normalize_absolute) {
            Some(final_url) if final_url != url => {
                if url == *self.scope.seed() && self.scope.follow_seed_redirect(&final_url) {
                    info!(
                        seed = %url,
                        target = %final_url,
                        "Seed redirected to another host, adding it to the crawl scope"
                    );
                }
                if !self.scope.contains(&final_url) {
                    self.fail(url, FetchError::RedirectOutOfScope(final_url.to_string()));
                    return;
                }
                if !self.discover_redirect_target(&final_url) {
                    debug!(
                        url = %url,
                        target = %final_url,
                        "Redirect target already crawled, skipping"
                    );
                    self.visited.insert(url, UrlState::Done);
                    return;
                }
                final_url
            }
            _ => url.clone(),
        };

        let order = self.pages.len();
        info!(url = %url, order, "Crawled page");

        let extraction = extract_links(&page.body, &base);
        if extraction.is_degraded() {
            debug!(
                url = %url,
                parse_errors = extraction.parse_errors,
                "Recovered from malformed HTML"
            );
        }

        let mut queued = 0;
        for link in extraction.links {
            if !self.scope.contains(&link) {
                debug!(link = %link, "Discarding out-of-scope link");
            } else if self.discover(link) {
                queued += 1;
            }
        }
        debug!(url = %url, queued, frontier = self.frontier.len(), "Links processed");

        self.visited.insert(url.clone(), UrlState::Done);
        self.pages.push(PageRecord {
            url,
            html: page.body,
            order,
        });
    }

    /// Claim a redirect target; false if it is already known to the crawl
    fn discover_redirect_target(&mut self, target: &Url) -> bool {
        if self.visited.contains_key(target) {
            return false;
        }
        self.visited.insert(target.clone(), UrlState::Done);
        true
    }

    fn fail(&mut self, url: Url, err: FetchError) {
        warn!(url = %url, reason = %err, "Failed to fetch page");
        self.visited.insert(url.clone(), UrlState::Failed);
        self.failures.push(FailedPage {
            url,
            reason: err.to_string(),
        });
    }

    fn into_report(self, status: CrawlStatus) -> CrawlReport {
        CrawlReport {
            pages: self.pages,
            failures: self.failures,
            status,
        }
    }
}
