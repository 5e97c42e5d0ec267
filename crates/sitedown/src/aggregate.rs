//! Aggregation of crawled pages into one Markdown document
//!
//! Every page becomes one section:
//!
//! ```text
//! ## Page: <url>
//! ---
//! <converted markdown>
//!
//! ```
//!
//! Sections follow page `order`; the trailing blank line separates them.

use crate::convert::Converter;
use crate::types::PageRecord;
use std::io::{self, Write};
use url::Url;

/// Format one document section
pub fn format_section(url: &Url, markdown: &str) -> String {
    format!("## Page: {}\n---\n{}\n\n", url, markdown)
}

/// Render pages into a single document, in ascending `order`
pub fn render<C: Converter + ?Sized>(records: &[PageRecord], converter: &C) -> String {
    let mut output = String::new();
    for record in sorted(records) {
        output.push_str(&format_section(&record.url, &converter.convert(&record.html)));
    }
    output
}

fn sorted(records: &[PageRecord]) -> Vec<&PageRecord> {
    let mut sorted: Vec<&PageRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.order);
    sorted
}

/// Streams document sections into a writer
///
/// Sections are written in the order pages are handed in; use
/// [`write_pages`](Self::write_pages) to sort a batch by `order` first.
pub struct MarkdownWriter<W: Write, C: Converter> {
    out: W,
    converter: C,
    sections: usize,
}

impl<W: Write, C: Converter> MarkdownWriter<W, C> {
    /// Create a writer over `out` that converts pages with `converter`
    pub fn new(out: W, converter: C) -> Self {
        Self {
            out,
            converter,
            sections: 0,
        }
    }

    /// Append one page as a section
    pub fn write_page(&mut self, record: &PageRecord) -> io::Result<()> {
        let markdown = self.converter.convert(&record.html);
        self.out
            .write_all(format_section(&record.url, &markdown).as_bytes())?;
        self.sections += 1;
        Ok(())
    }

    /// Append all pages in ascending `order`
    pub fn write_pages(&mut self, records: &[PageRecord]) -> io::Result<()> {
        for record in sorted(records) {
            self.write_page(record)?;
        }
        Ok(())
    }

    /// Number of sections written so far
    pub fn sections(&self) -> usize {
        self.sections
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
