// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the CLI is a plain struct, and clap generates the
// parsing, --help and --version from the attributes.
//
// The struct only holds what the user typed. Turning it into a validated
// CrawlConfig happens in `into_options` + CrawlConfig::from_options, so the
// library applies exactly the same checks as the CLI.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use link_warden::config::{
    CrawlOptions, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_THREADS, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};

#[derive(Parser, Debug)]
#[command(
    name = "link-warden",
    version,
    about = "Crawl a website and check for broken links",
    long_about = "link-warden crawls a website from a starting URL, checks every link, image, script, \
                  iframe and stylesheet it finds, and reports the broken ones grouped by page."
)]
pub struct Cli {
    /// The URL to start crawling from
    pub url: String,

    /// Maximum number of concurrent requests
    #[arg(long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Custom user agent string
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Number of times to retry timeouts, connection failures and 5xx responses
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,

    /// Delay before the first retry in milliseconds (doubles on each retry)
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY_MS)]
    pub retry_delay: u64,

    /// Crawl pages on every domain, not just the starting domain
    #[arg(long, conflicts_with = "allowed_domains")]
    pub all_domains: bool,

    /// Crawl pages only on these domains (comma separated, repeatable)
    #[arg(long, value_delimiter = ',')]
    pub allowed_domains: Vec<String>,

    /// Regex for URLs to ignore. Can be used multiple times
    #[arg(long = "ignore")]
    pub ignore: Vec<String>,

    /// Save the report to a file instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Show debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn into_options(self) -> CrawlOptions {
        CrawlOptions {
            seed: self.url,
            max_threads: self.threads,
            timeout: Duration::from_secs(self.timeout),
            retries: self.retries,
            retry_delay: Duration::from_millis(self.retry_delay),
            user_agent: Some(self.user_agent),
            all_domains: self.all_domains,
            allowed_domains: self.allowed_domains,
            ignore_patterns: self.ignore,
        }
    }
}
