//! Link extraction from HTML pages
//!
//! Parsing goes through `scraper` (html5ever), which recovers from broken
//! markup instead of failing. Recovered parse errors are counted so the
//! crawler can log degraded pages, but they never make extraction fail.

use crate::scope::normalize;
use scraper::{Html, Selector};
use url::Url;

/// Elements whose `href` leads to another page
const LINK_SELECTOR: &str = "a[href], area[href]";

/// Links found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkExtraction {
    /// Normalized HTTP(S) link targets in document order, duplicates included
    pub links: Vec<Url>,

    /// Number of parse errors html5ever recovered from
    pub parse_errors: usize,
}

impl LinkExtraction {
    /// True when the parser had to recover from malformed markup
    pub fn is_degraded(&self) -> bool {
        self.parse_errors > 0
    }
}

/// Extract hyperlink targets from `html`, resolved against `page_url`
///
/// A `<base href>` element in the document overrides `page_url` for
/// resolution. Empty and fragment-only hrefs point back at the same page
/// and are skipped, as are non-HTTP(S) targets. Scope filtering is left to
/// the caller.
pub fn extract_links(html: &str, page_url: &Url) -> LinkExtraction {
    let document = Html::parse_document(html);
    let parse_errors = document.errors.len();

    let Ok(selector) = Selector::parse(LINK_SELECTOR) else {
        return LinkExtraction {
            links: Vec::new(),
            parse_errors,
        };
    };

    let base = document_base(&document, page_url);

    let links = document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .filter_map(|href| normalize(href, &base))
        .collect();

    LinkExtraction {
        links,
        parse_errors,
    }
}

/// Resolve the effective base URL from a `<base href>` element
fn document_base(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    fn urls(extraction: &LinkExtraction) -> Vec<&str> {
        extraction.links.iter().map(Url::as_str).collect()
    }

    #[test]
    fn test_fragment_only_links_skipped() {
        let html = r##"<a href="#frag">x</a><a href="/p2">y</a>"##;
        let extraction = extract_links(html, &page());
        assert_eq!(urls(&extraction), vec!["https://example.com/p2"]);
    }

    #[test]
    fn test_document_order_and_duplicates_kept() {
        let html = r#"
            <a href="/b">B</a>
            <a href="/a">A</a>
            <a href="/b">B again</a>
        "#;
        let extraction = extract_links(html, &page());
        assert_eq!(
            urls(&extraction),
            vec![
                "https://example.com/b",
                "https://example.com/a",
                "https://example.com/b"
            ]
        );
    }

    #[test]
    fn test_relative_resolution() {
        let page = Url::parse("https://example.com/docs/intro").unwrap();
        let html = r#"<a href="setup">s</a><a href="../faq">f</a><a href="https://other.org/x">o</a>"#;
        let extraction = extract_links(html, &page);
        assert_eq!(
            urls(&extraction),
            vec![
                "https://example.com/docs/setup",
                "https://example.com/faq",
                "https://other.org/x"
            ]
        );
    }

    #[test]
    fn test_base_element_overrides_page_url() {
        let html = r#"<html><head><base href="/v2/"></head>
            <body><a href="guide">g</a></body></html>"#;
        let extraction = extract_links(html, &page());
        assert_eq!(urls(&extraction), vec!["https://example.com/v2/guide"]);
    }

    #[test]
    fn test_area_and_empty_href() {
        let html = r#"<map><area href="/region"></map><a href="">self</a><a>no href</a>"#;
        let extraction = extract_links(html, &page());
        assert_eq!(urls(&extraction), vec!["https://example.com/region"]);
    }

    #[test]
    fn test_other_schemes_dropped() {
        let html = r#"<a href="mailto:hi@example.com">m</a><a href="javascript:void(0)">j</a>
            <a href="/docs#install">d</a>"#;
        let extraction = extract_links(html, &page());
        assert_eq!(urls(&extraction), vec!["https://example.com/docs"]);
    }

    #[test]
    fn test_malformed_html_is_best_effort() {
        let html = r#"<div><a href="/ok">ok<p></div></span><a href="/still">still"#;
        let extraction = extract_links(html, &page());
        assert!(urls(&extraction).contains(&"https://example.com/ok"));
        assert!(urls(&extraction).contains(&"https://example.com/still"));
        assert!(extraction.is_degraded());
    }

    #[test]
    fn test_empty_document() {
        let extraction = extract_links("", &page());
        assert!(extraction.links.is_empty());
    }
}
