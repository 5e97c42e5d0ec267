//! SiteDown - flatten a website into one Markdown document
//!
//! This crate crawls every page reachable by hyperlink from a seed URL on
//! the seed's host, and renders the pages into a single Markdown document
//! with one section per page.
//!
//! ## Pipeline
//!
//! - [`Crawler`] walks the site breadth-first, using a [`Fetcher`] to
//!   retrieve pages, [`extract_links`] to discover new ones and [`Scope`]
//!   to keep the crawl on the seed's host. It yields a [`CrawlReport`] of
//!   [`PageRecord`]s in visitation order.
//! - [`render`] or [`MarkdownWriter`] turn the records into the final
//!   document through a [`Converter`] ([`MarkdownConverter`] by default).
//!
//! A page that fails to fetch is recorded in the report and skipped; it
//! never stops the crawl. Only an invalid seed URL or an output write
//! error is fatal.
//!
//! ```no_run
//! # async fn example() -> Result<(), sitedown::CrawlError> {
//! let report = sitedown::crawl("https://example.com/docs/").await?;
//! let document = sitedown::render(&report.pages, &sitedown::MarkdownConverter::new());
//! println!("{document}");
//! # Ok(())
//! # }
//! ```

mod aggregate;
pub mod client;
mod convert;
mod crawler;
mod error;
pub mod fetchers;
mod links;
mod scope;
mod types;

pub use aggregate::{format_section, render, MarkdownWriter};
pub use client::{crawl, crawl_with_options, FetchOptions};
pub use convert::{html_to_markdown, is_html, tidy_lines, Converter, MarkdownConverter};
pub use crawler::{CrawlOptions, Crawler, CrawlerBuilder, UrlState};
pub use error::{CrawlError, FetchError};
pub use fetchers::{Fetcher, HttpFetcher};
pub use links::{extract_links, LinkExtraction};
pub use scope::{is_in_scope, normalize, normalize_absolute, Scope};
pub use types::{
    CrawlReport, CrawlStatus, CrawlSummary, FailedPage, FetchOutcome, FetchedPage, PageRecord,
    PageSummary,
};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = concat!("SiteDown/", env!("CARGO_PKG_VERSION"));
