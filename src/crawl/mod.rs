// src/crawl/mod.rs
// =============================================================================
// This module handles crawling a whole website.
//
// Submodules:
// - resolve: raw reference -> canonical absolute URL (or rejection)
// - policy: which URLs get scanned for links and which only get checked
// - queue: the shared Frontier and VisitedSet
// - cache: one fetch per URL per run, shared by tasks and Markdown candidates
// - coordinator: the worker pool tying it all together
// =============================================================================

mod cache;
mod coordinator;
mod policy;
mod queue;
mod resolve;

pub use cache::FetchCache;
pub use coordinator::Crawler;
pub use policy::{classify, is_external, Scope};
pub use queue::{Claim, CrawlTask, Frontier, Referrer, TaskLease, VisitedSet};
pub use resolve::{markdown_candidates, Rejection, Resolver};

use crate::checker::ReqwestTransport;
use crate::config::CrawlConfig;
use crate::report::CrawlReport;

// Crawls a website over real HTTP with the given configuration
//
// Only building the HTTP client can fail; everything that goes wrong during
// the crawl itself ends up in the report.
pub async fn crawl_website(config: CrawlConfig) -> reqwest::Result<CrawlReport> {
    let transport = ReqwestTransport::new(&config)?;
    Ok(Crawler::new(config, transport).run().await)
}
