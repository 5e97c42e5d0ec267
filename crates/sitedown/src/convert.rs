//! HTML conversion utilities
//!
//! The converter is a single-pass tag scanner rather than a DOM walk. It
//! never fails: unknown tags are dropped, unterminated tags end the input,
//! and unknown entities are emitted verbatim. Attribute values are read by
//! handing the tag to `scraper`.

use scraper::{ElementRef, Html};
use std::iter::Peekable;
use std::str::Chars;

/// Elements whose content is never rendered
const SKIP_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "iframe", "svg", "template",
];

/// Turns an HTML document into Markdown
///
/// Implementations must be infallible: malformed input degrades the
/// output instead of producing an error.
pub trait Converter: Send + Sync {
    /// Convert an HTML string to Markdown
    fn convert(&self, html: &str) -> String;
}

/// Default HTML to Markdown converter
#[derive(Debug, Clone, Copy)]
pub struct MarkdownConverter {
    ignore_links: bool,
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConverter {
    /// Create a converter that keeps link text but drops link targets
    pub fn new() -> Self {
        Self { ignore_links: true }
    }

    /// Render links as `[text](href)` instead of bare text
    pub fn keep_links(mut self, keep: bool) -> Self {
        self.ignore_links = !keep;
        self
    }
}

impl Converter for MarkdownConverter {
    fn convert(&self, html: &str) -> String {
        render_markdown(html, self.ignore_links)
    }
}

impl<F> Converter for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn convert(&self, html: &str) -> String {
        self(html)
    }
}

/// Check if content is HTML based on content type and body
pub fn is_html(content_type: &Option<String>, body: &str) -> bool {
    // Check Content-Type
    if let Some(ct) = content_type {
        let ct_lower = ct.to_lowercase();
        if ct_lower.contains("text/html") || ct_lower.contains("application/xhtml") {
            return true;
        }
    }

    // Check body start
    let trimmed = body.trim_start();
    let head: String = trimmed.chars().take(9).collect::<String>().to_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

/// Convert HTML to markdown, keeping link text only
pub fn html_to_markdown(html: &str) -> String {
    render_markdown(html, true)
}

fn render_markdown(html: &str, ignore_links: bool) -> String {
    let mut output = String::new();
    let mut quote_parents: Vec<String> = Vec::new();
    let mut skip_elements: Vec<String> = Vec::new();
    let mut list_depth: usize = 0;
    let mut in_pre = false;
    let mut open_links: Vec<Option<String>> = Vec::new();

    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '<' {
            let Some(tag) = read_tag(&mut chars) else {
                break;
            };

            let tag_lower = tag.to_lowercase();
            if tag_lower.starts_with('!') || tag_lower.starts_with('?') {
                continue;
            }

            let is_closing = tag_lower.starts_with('/');
            let tag_name = tag_lower
                .trim_start_matches('/')
                .split(|ch: char| ch.is_whitespace() || ch == '/')
                .next()
                .unwrap_or("");

            if SKIP_TAGS.contains(&tag_name) {
                if is_closing {
                    if let Some(pos) = skip_elements.iter().rposition(|t| t == tag_name) {
                        skip_elements.truncate(pos);
                    }
                } else if !tag.ends_with('/') {
                    skip_elements.push(tag_name.to_string());
                }
                continue;
            }

            if !skip_elements.is_empty() {
                continue;
            }

            match tag_name {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    if is_closing {
                        output.push_str("\n\n");
                    } else {
                        let level = tag_name[1..].parse::<usize>().unwrap_or(1);
                        output.push_str("\n\n");
                        output.push_str(&"#".repeat(level));
                        output.push(' ');
                    }
                }
                "p" | "div" | "section" | "article" | "main" | "header" | "footer" | "nav"
                | "aside" | "table" | "tr" | "dl" | "dt" | "dd" | "figure" => {
                    output.push_str(if is_closing { "\n\n" } else { "\n" });
                }
                "br" => {
                    output.push('\n');
                }
                "hr" => {
                    output.push_str("\n\n---\n\n");
                }
                "td" | "th" => {
                    if is_closing {
                        output.push(' ');
                    }
                }
                "ul" | "ol" => {
                    if is_closing {
                        list_depth = list_depth.saturating_sub(1);
                        if list_depth == 0 {
                            output.push('\n');
                        }
                    } else {
                        list_depth += 1;
                    }
                }
                "li" => {
                    if !is_closing {
                        output.push('\n');
                        output.push_str(&"  ".repeat(list_depth.saturating_sub(1)));
                        output.push_str("- ");
                    }
                }
                "strong" | "b" => {
                    output.push_str("**");
                }
                "em" | "i" => {
                    output.push('*');
                }
                "pre" => {
                    output.push_str("\n```\n");
                    in_pre = !is_closing;
                }
                "code" => {
                    if !in_pre {
                        output.push('`');
                    }
                }
                "blockquote" => {
                    if is_closing {
                        if let Some(parent) = quote_parents.pop() {
                            close_quote(&mut output, parent);
                        }
                    } else {
                        quote_parents.push(std::mem::take(&mut output));
                    }
                }
                "a" if !ignore_links => {
                    if is_closing {
                        if let Some(Some(href)) = open_links.pop() {
                            output.push_str(&format!("]({})", href));
                        }
                    } else {
                        let href = extract_attribute(&tag, "href");
                        if href.is_some() {
                            output.push('[');
                        }
                        open_links.push(href);
                    }
                }
                _ => {}
            }
        } else if skip_elements.is_empty() {
            let decoded = decode_entity(c, &mut chars);
            if in_pre || !decoded.is_whitespace() {
                output.push(decoded);
            } else if !output.is_empty() && !output.ends_with(char::is_whitespace) {
                output.push(' ');
            }
        }
    }

    // Close whatever truncated markup left open
    while let Some(href) = open_links.pop() {
        if let Some(href) = href {
            output.push_str(&format!("]({})", href));
        }
    }
    while let Some(parent) = quote_parents.pop() {
        close_quote(&mut output, parent);
    }

    tidy_lines(&output)
}

/// Replace `output` with `parent` followed by `output` rendered as a quote
fn close_quote(output: &mut String, parent: String) {
    let inner = std::mem::replace(output, parent);
    let quoted: Vec<String> = tidy_lines(&inner)
        .lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {}", line)
            }
        })
        .collect();

    output.push_str("\n\n");
    output.push_str(&quoted.join("\n"));
    output.push_str("\n\n");
}

/// Read a tag body after `<`, up to and excluding the closing `>`
///
/// Comments are consumed through their `-->` terminator. Returns `None`
/// when the input ends before the tag does.
fn read_tag(chars: &mut Peekable<Chars>) -> Option<String> {
    let mut tag = String::new();
    loop {
        let next = chars.next()?;
        if next == '>' && (!tag.starts_with("!--") || (tag.len() >= 5 && tag.ends_with("--"))) {
            return Some(tag);
        }
        tag.push(next);
    }
}

/// Extract an attribute value from a tag body such as `a href="/x"`
///
/// The tag is handed to html5ever, so attribute names match whole and
/// case-insensitively, and character references in the value are decoded.
fn extract_attribute(tag: &str, attr: &str) -> Option<String> {
    let fragment = Html::parse_fragment(&format!("<{}>", tag));
    let element = fragment
        .root_element()
        .children()
        .find_map(ElementRef::wrap)?;
    element.value().attr(attr).map(str::to_string)
}

/// Decode HTML entity starting from ampersand
fn decode_entity(c: char, chars: &mut Peekable<Chars>) -> char {
    if c != '&' {
        return c;
    }

    // Look ahead without consuming so invalid entities leave the text intact
    let lookahead: String = chars.clone().take(12).collect();
    let Some(end) = lookahead.find(';') else {
        return '&';
    };
    let entity = &lookahead[..end];
    if entity.is_empty() || entity.contains(char::is_whitespace) {
        return '&';
    }

    let decoded = match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "mdash" => Some('—'),
        "ndash" => Some('–'),
        "hellip" => Some('…'),
        "copy" => Some('©'),
        "reg" => Some('®'),
        _ => entity.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
        }),
    };

    match decoded {
        Some(ch) => {
            // Consume the entity name and its terminating ';'
            for _ in 0..=entity.chars().count() {
                chars.next();
            }
            ch
        }
        None => '&',
    }
}

/// Trim line ends, drop leading and trailing blank lines, and keep at
/// most one blank line between blocks
///
/// Leading indentation is preserved so nested list items and preformatted
/// text keep their shape.
pub fn tidy_lines(s: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0;

    for line in s.lines() {
        let line = line.trim_end();
        if line.trim_start().is_empty() {
            blank_run += 1;
            if blank_run == 1 && !lines.is_empty() {
                lines.push("");
            }
        } else {
            blank_run = 0;
            lines.push(line);
        }
    }

    while lines.last() == Some(&"") {
        lines.pop();
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_html_by_content_type() {
        assert!(is_html(&Some("text/html".to_string()), ""));
        assert!(is_html(&Some("text/html; charset=utf-8".to_string()), ""));
        assert!(is_html(&Some("application/xhtml+xml".to_string()), ""));
        assert!(!is_html(&Some("text/plain".to_string()), ""));
        assert!(!is_html(&Some("application/json".to_string()), ""));
    }

    #[test]
    fn test_is_html_by_body() {
        assert!(is_html(&None, "<!DOCTYPE html><html>"));
        assert!(is_html(&None, "  <!doctype html>"));
        assert!(is_html(&None, "<html><body>"));
        assert!(is_html(&None, "<HTML><BODY>"));
        assert!(!is_html(&None, "Hello world"));
        assert!(!is_html(&None, "{\"json\": true}"));
    }

    #[test]
    fn test_html_to_markdown_headers() {
        assert_eq!(html_to_markdown("<h1>Hi</h1>"), "# Hi");

        let md = html_to_markdown("<h1>Title</h1><h2>Subtitle</h2><h6>Deep</h6>");
        assert!(md.contains("# Title"));
        assert!(md.contains("## Subtitle"));
        assert!(md.contains("###### Deep"));
    }

    #[test]
    fn test_html_to_markdown_paragraphs() {
        let md = html_to_markdown("<p>First paragraph</p><p>Second paragraph</p>");
        assert_eq!(md, "First paragraph\n\nSecond paragraph");
    }

    #[test]
    fn test_html_to_markdown_lists() {
        let md = html_to_markdown("<ul><li>Item 1</li><li>Item 2<ul><li>Nested</li></ul></li></ul>");
        assert!(md.contains("- Item 1"));
        assert!(md.contains("- Item 2"));
        assert!(md.contains("  - Nested"));
    }

    #[test]
    fn test_html_to_markdown_emphasis() {
        let md = html_to_markdown("<p><strong>bold</strong> and <em>italic</em></p>");
        assert_eq!(md, "**bold** and *italic*");
    }

    #[test]
    fn test_html_to_markdown_code() {
        let md = html_to_markdown("<pre>code block</pre><p>use <code>cargo</code></p>");
        assert!(md.contains("```\ncode block\n```"));
        assert!(md.contains("`cargo`"));
    }

    #[test]
    fn test_html_to_markdown_blockquote() {
        let md = html_to_markdown("<blockquote>quoted</blockquote>");
        assert_eq!(md, "> quoted");
    }

    #[test]
    fn test_html_to_markdown_skips_non_content() {
        let html = "<html><head><title>T</title><style>p{}</style></head><body>\
                    <p>Before</p><script>alert('bad');</script><p>After</p></body></html>";
        let md = html_to_markdown(html);
        assert_eq!(md, "Before\n\nAfter");
    }

    #[test]
    fn test_html_to_markdown_comments() {
        let md = html_to_markdown("<p>a<!-- <b>hidden</b> -->b</p>");
        assert_eq!(md, "ab");
    }

    #[test]
    fn test_links_ignored_by_default() {
        let md = html_to_markdown(r#"<p>See <a href="/docs">the docs</a>.</p>"#);
        assert_eq!(md, "See the docs.");
    }

    #[test]
    fn test_links_kept_when_enabled() {
        let converter = MarkdownConverter::new().keep_links(true);
        let md = converter.convert(r#"<p>See <a href="/docs">the docs</a> or <a name="x">anchor</a>.</p>"#);
        assert_eq!(md, "See [the docs](/docs) or anchor.");
    }

    #[test]
    fn test_unterminated_markup_degrades() {
        let converter = MarkdownConverter::new().keep_links(true);
        assert_eq!(converter.convert(r#"<p>text <a href="/x">open"#), "text [open](/x)");
        assert_eq!(html_to_markdown("<p>cut off <b"), "cut off");
    }

    #[test]
    fn test_closure_converter() {
        let upper = |html: &str| html.to_uppercase();
        assert_eq!(upper.convert("<p>x</p>"), "<P>X</P>");
    }

    #[test]
    fn test_entity_decoding() {
        let md = html_to_markdown(
            "<p>&amp; &lt; &gt; &quot; &apos; &mdash; &ndash; &copy; &reg; &#65; &#x42;</p>",
        );
        assert_eq!(md, "& < > \" ' — – © ® A B");
    }

    #[test]
    fn test_invalid_entity_left_intact() {
        assert_eq!(html_to_markdown("<p>Tom & Jerry</p>"), "Tom & Jerry");
        assert_eq!(html_to_markdown("<p>a &bogus; b</p>"), "a &bogus; b");
        assert_eq!(html_to_markdown("<p>R&D</p>"), "R&D");
    }

    #[test]
    fn test_source_whitespace_collapsed() {
        let html = "<ul>\n    <li>One\n  item</li>\n    <li>Two</li>\n</ul>";
        assert_eq!(html_to_markdown(html), "- One item\n- Two");
    }

    #[test]
    fn test_multi_paragraph_blockquote() {
        let md = html_to_markdown("<p>Intro</p><blockquote><p>one</p><p>two</p></blockquote><p>Outro</p>");
        assert_eq!(md, "Intro\n\n> one\n>\n> two\n\nOutro");
    }

    #[test]
    fn test_tidy_lines() {
        let output = tidy_lines("\n\n  hello world  \n\n\n\n  test  \n\n");
        assert_eq!(output, "  hello world\n\n  test");
    }

    #[test]
    fn test_extract_attribute() {
        assert_eq!(
            extract_attribute("a href=\"https://example.com\" class=\"link\"", "href"),
            Some("https://example.com".to_string())
        );
        assert_eq!(
            extract_attribute("a href='page.html'", "href"),
            Some("page.html".to_string())
        );
        assert_eq!(
            extract_attribute("div class=test", "class"),
            Some("test".to_string())
        );
        assert_eq!(extract_attribute("a name=\"x\"", "href"), None);
        assert_eq!(
            extract_attribute("A HREF=\"/upper\"", "href"),
            Some("/upper".to_string())
        );
        assert_eq!(
            extract_attribute("a href=\"/q?a=1&amp;b=2\"", "href"),
            Some("/q?a=1&b=2".to_string())
        );
    }

    #[test]
    fn test_attribute_name_matches_whole_token() {
        assert_eq!(
            extract_attribute("a data-href=\"/wrong\" href=\"/right\"", "href"),
            Some("/right".to_string())
        );
        assert_eq!(extract_attribute("a data-href=\"/only\"", "href"), None);

        let converter = MarkdownConverter::new().keep_links(true);
        assert_eq!(
            converter.convert(r#"<a data-href="/wrong" href="/right">x</a>"#),
            "[x](/right)"
        );
    }

    #[test]
    fn test_non_ascii_attributes_do_not_panic() {
        let converter = MarkdownConverter::new().keep_links(true);
        assert_eq!(
            converter.convert(r#"<p><a title="İİ" href="é">x</a></p>"#),
            "[x](é)"
        );
        assert_eq!(
            converter.convert(r#"<p><a TİTLE="x" href="/ok">y</a></p>"#),
            "[y](/ok)"
        );
    }
}
