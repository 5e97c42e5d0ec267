//! SiteDown CLI - crawl a website and save it as one Markdown document

use clap::Parser;
use sitedown::{
    CrawlError, CrawlReport, CrawlStatus, Crawler, MarkdownConverter, MarkdownWriter, Scope,
};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// SiteDown - flatten a website into a single Markdown file
#[derive(Parser, Debug)]
#[command(name = "sitedown")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Start URL; only pages on the same host are crawled
    url: String,

    /// Output file
    #[arg(long, short, default_value = "output.md")]
    output: PathBuf,

    /// Custom User-Agent
    #[arg(long)]
    user_agent: Option<String>,

    /// Connect and read timeout per request, in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Maximum number of pages fetched at once
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Render hyperlinks as Markdown links instead of plain text
    #[arg(long)]
    keep_links: bool,

    /// Stop crawling after this many seconds and save what was collected
    #[arg(long)]
    max_duration: Option<u64>,

    /// Also write a JSON crawl report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log every fetch and discovered link
    #[arg(long, short, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_filter(cli.verbose, cli.quiet)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    // Reject a bad seed before touching the filesystem
    if let Err(e) = Scope::from_seed(&cli.url) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let file = File::create(&cli.output).unwrap_or_else(|e| {
        eprintln!("Error: cannot create {}: {}", cli.output.display(), e);
        std::process::exit(1);
    });

    let crawler = build_crawler(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", describe(&e));
        std::process::exit(1);
    });

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, cli.max_duration.map(Duration::from_secs));

    let report = match crawler.crawl_with_cancellation(&cli.url, cancel).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", describe(&e));
            std::process::exit(1);
        }
    };

    let converter = MarkdownConverter::new().keep_links(cli.keep_links);
    if let Err(e) = write_document(BufWriter::new(file), converter, &report) {
        eprintln!("Error: {}", describe(&e));
        std::process::exit(1);
    }

    if let Some(ref path) = cli.report {
        if let Err(e) = write_report(path, &report) {
            eprintln!("Error: {}", describe(&e));
            std::process::exit(1);
        }
    }

    if !report.failures.is_empty() {
        eprint!("{}", format_failure_summary(&report));
    }
    if report.status == CrawlStatus::Cancelled {
        eprintln!(
            "Crawl stopped early; saved {} page(s) collected so far",
            report.pages.len()
        );
    }

    println!("All content saved to {}", cli.output.display());
}

/// Tracing filter for the chosen verbosity
fn log_filter(verbose: bool, quiet: bool) -> String {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    format!("warn,sitedown={}", level)
}

fn build_crawler(cli: &Cli) -> Result<Crawler, CrawlError> {
    let mut builder = Crawler::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .concurrency(cli.concurrency);

    if let Some(ref ua) = cli.user_agent {
        builder = builder.user_agent(ua.clone());
    }

    builder.build()
}

/// Cancel the crawl on Ctrl-C or once `max_duration` has elapsed
fn spawn_cancel_triggers(cancel: &CancellationToken, max_duration: Option<Duration>) {
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, saving pages crawled so far");
            on_signal.cancel();
        }
    });

    if let Some(limit) = max_duration {
        let on_deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            warn!(seconds = limit.as_secs(), "Time limit reached, stopping crawl");
            on_deadline.cancel();
        });
    }
}

fn write_document<W: Write>(
    out: W,
    converter: MarkdownConverter,
    report: &CrawlReport,
) -> Result<W, CrawlError> {
    let mut writer = MarkdownWriter::new(out, converter);
    writer.write_pages(&report.pages).map_err(CrawlError::Output)?;
    writer.finish().map_err(CrawlError::Output)
}

fn write_report(path: &Path, report: &CrawlReport) -> Result<(), CrawlError> {
    let json = serde_json::to_string_pretty(&report.summary())
        .map_err(|e| CrawlError::Output(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    std::fs::write(path, json + "\n").map_err(CrawlError::Output)
}

/// Summary of failed URLs for stderr
fn format_failure_summary(report: &CrawlReport) -> String {
    let mut output = format!("Failed to crawl {} URL(s):\n", report.failures.len());
    for failure in &report.failures {
        output.push_str(&format!("  {} ({})\n", failure.url, failure.reason));
    }
    output
}

/// Render an error with its source chain
fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
