// src/lib.rs
// =============================================================================
// link-warden: crawl a website and report every broken link, image, script,
// iframe and stylesheet reference, grouped by the page it was found on.
//
// Modules:
// - config: validated, immutable settings for one run
// - checker: fetching single URLs and extracting references from bodies
// - crawl: the concurrent crawl engine
// - report: collecting results and rendering the report
//
// Example:
//   let config = CrawlConfig::from_options(CrawlOptions::new("https://example.com"))?;
//   let report = link_warden::crawl_website(config).await?;
//   println!("{report}");
// =============================================================================

pub mod checker;
pub mod config;
pub mod crawl;
pub mod report;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, CrawlConfig, CrawlOptions, DomainMode};
pub use crawl::{crawl_website, Crawler};
pub use report::{BrokenLinkRecord, CrawlReport, ResultAggregator};
