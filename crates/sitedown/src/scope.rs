//! Domain filter: URL normalization and crawl scoping
//!
//! A normalized URL is absolute, uses `http` or `https`, and carries no
//! fragment. Everything else (scheme, host, port, path, query) is kept,
//! so `?page=2` and `?page=3` stay distinct while `#intro` and `#usage`
//! collapse onto the same page.
//!
//! Scope is the seed's host, compared case-insensitively. `www.example.com`
//! and `example.com` are different hosts, as are any subdomains. The scheme
//! and port do not take part in the scope check. When the seed page itself
//! redirects to another host, that host joins the scope.

use crate::error::CrawlError;
use url::Url;

/// Resolve `raw` against `base` and normalize the result
///
/// Returns `None` for unparseable input and for non-HTTP(S) schemes such
/// as `mailto:`, `javascript:` or `tel:`.
pub fn normalize(raw: &str, base: &Url) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let url = base.join(trimmed).ok()?;
    normalize_absolute(url)
}

/// Normalize an already-absolute URL
pub fn normalize_absolute(mut url: Url) -> Option<Url> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str()?;

    url.set_fragment(None);
    if url.query() == Some("") {
        url.set_query(None);
    }
    Some(url)
}

/// Check whether a URL's host equals `seed_host`, ignoring ASCII case
pub fn is_in_scope(url: &Url, seed_host: &str) -> bool {
    url.host_str()
        .map(|host| host.eq_ignore_ascii_case(seed_host))
        .unwrap_or(false)
}

/// Crawl scope derived from a seed URL
#[derive(Debug, Clone)]
pub struct Scope {
    seed: Url,
    host: String,
    aliases: Vec<String>,
}

impl Scope {
    /// Validate a seed URL and derive the scope from it
    pub fn from_seed(seed: &str) -> Result<Self, CrawlError> {
        let parsed = Url::parse(seed.trim())
            .map_err(|e| CrawlError::InvalidSeed(format!("{seed}: {e}")))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(CrawlError::InvalidSeed(format!(
                "{seed}: must start with http:// or https://"
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| CrawlError::InvalidSeed(format!("{seed}: URL has no host")))?
            .to_ascii_lowercase();

        let seed = normalize_absolute(parsed)
            .ok_or_else(|| CrawlError::InvalidSeed(seed.to_string()))?;

        Ok(Self {
            seed,
            host,
            aliases: Vec::new(),
        })
    }

    /// Normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Lowercased seed host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Hosts admitted because the seed redirected to them
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Admit the host of the seed's redirect target
    ///
    /// Returns false if the target has no host or is already in scope.
    pub fn follow_seed_redirect(&mut self, target: &Url) -> bool {
        if self.contains(target) {
            return false;
        }
        let Some(host) = target.host_str() else {
            return false;
        };
        self.aliases.push(host.to_ascii_lowercase());
        true
    }

    /// Check whether a normalized URL belongs to this crawl
    pub fn contains(&self, url: &Url) -> bool {
        is_in_scope(url, &self.host)
            || self.aliases.iter().any(|host| is_in_scope(url, host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/intro").unwrap()
    }

    fn norm(raw: &str) -> Option<String> {
        normalize(raw, &base()).map(|u| u.to_string())
    }

    #[test]
    fn test_normalize_relative() {
        assert_eq!(norm("/guide"), Some("https://example.com/guide".to_string()));
        assert_eq!(
            norm("setup"),
            Some("https://example.com/docs/setup".to_string())
        );
        assert_eq!(norm("../about"), Some("https://example.com/about".to_string()));
    }

    #[test]
    fn test_normalize_strips_fragment_keeps_query() {
        assert_eq!(
            norm("/page?x=1#section"),
            Some("https://example.com/page?x=1".to_string())
        );
        assert_eq!(norm("#top"), Some("https://example.com/docs/intro".to_string()));
        assert_ne!(norm("/list?page=1"), norm("/list?page=2"));
        assert_eq!(norm("/list#a"), norm("/list#b"));
    }

    #[test]
    fn test_normalize_canonical_forms() {
        assert_eq!(
            norm("HTTPS://EXAMPLE.COM"),
            Some("https://example.com/".to_string())
        );
        assert_eq!(
            norm("https://example.com:443/a"),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(norm("/a?"), Some("https://example.com/a".to_string()));
        // Trailing slashes are significant
        assert_ne!(norm("/docs"), norm("/docs/"));
    }

    #[test]
    fn test_normalize_rejects_other_schemes() {
        assert_eq!(norm("mailto:team@example.com"), None);
        assert_eq!(norm("javascript:void(0)"), None);
        assert_eq!(norm("tel:+15555555555"), None);
        assert_eq!(norm("ftp://example.com/file"), None);
        assert_eq!(norm("data:text/plain,hi"), None);
        assert_eq!(norm(""), None);
        assert_eq!(norm("   "), None);
    }

    #[test]
    fn test_is_in_scope() {
        let url = Url::parse("https://Example.COM/page").unwrap();
        assert!(is_in_scope(&url, "example.com"));
        assert!(is_in_scope(&url, "EXAMPLE.com"));

        let sub = Url::parse("https://docs.example.com/").unwrap();
        assert!(!is_in_scope(&sub, "example.com"));

        let www = Url::parse("https://www.example.com/").unwrap();
        assert!(!is_in_scope(&www, "example.com"));

        let plain_http = Url::parse("http://example.com/").unwrap();
        assert!(is_in_scope(&plain_http, "example.com"));
    }

    #[test]
    fn test_scope_from_seed() {
        let scope = Scope::from_seed("https://Example.com/start#top").unwrap();
        assert_eq!(scope.host(), "example.com");
        assert_eq!(scope.seed().as_str(), "https://example.com/start");
    }

    #[test]
    fn test_scope_rejects_bad_seeds() {
        assert!(matches!(
            Scope::from_seed("not a url"),
            Err(CrawlError::InvalidSeed(_))
        ));
        assert!(matches!(
            Scope::from_seed("ftp://example.com/"),
            Err(CrawlError::InvalidSeed(_))
        ));
        assert!(matches!(
            Scope::from_seed("mailto:someone@example.com"),
            Err(CrawlError::InvalidSeed(_))
        ));
    }

    #[test]
    fn test_seed_redirect_widens_scope() {
        let mut scope = Scope::from_seed("https://example.com/").unwrap();
        let www = Url::parse("https://WWW.example.com/home").unwrap();
        assert!(!scope.contains(&www));

        assert!(scope.follow_seed_redirect(&www));
        assert!(scope.contains(&www));
        assert!(scope.contains(&Url::parse("https://example.com/a").unwrap()));
        assert!(!scope.contains(&Url::parse("https://docs.example.com/").unwrap()));
        assert_eq!(scope.aliases(), ["www.example.com".to_string()]);

        // Already in scope
        assert!(!scope.follow_seed_redirect(&www));
        assert_eq!(scope.aliases().len(), 1);
    }
}
