// src/report.rs
// =============================================================================
// Collects crawl results from every worker and renders the final report.
//
// ResultAggregator
// - record_broken / record_crawled are called concurrently from all workers
// - Updates go through a single mutex
// - Each broken record carries its link's position on the page. Fetches
//   finish in whatever order the network allows, so finalize() puts every
//   page's records back into the order the page listed them
//
// CrawlReport
// - Pages appear in the order their first broken link was recorded
// - Renders as plain text (Display) or serializes to JSON (serde)
// =============================================================================

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::trace;
use url::Url;

use crate::checker::BrokenReason;

/// One broken reference found on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLinkRecord {
    pub source_page: String,
    pub broken_url: String,
    pub reason: BrokenReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub page: String,
    pub broken: Vec<BrokenLinkRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub pages: Vec<PageReport>,
    /// URLs processed on the seed's host
    pub total_urls_crawled: usize,
    /// URLs processed on any other host
    pub external_links_found: usize,
}

impl CrawlReport {
    pub fn broken_count(&self) -> usize {
        self.pages.iter().map(|page| page.broken.len()).sum()
    }

    pub fn has_broken_links(&self) -> bool {
        self.pages.iter().any(|page| !page.broken.is_empty())
    }

    pub fn broken_on(&self, page: &str) -> &[BrokenLinkRecord] {
        self.pages
            .iter()
            .find(|report| report.page == page)
            .map(|report| report.broken.as_slice())
            .unwrap_or_default()
    }

    pub fn records(&self) -> impl Iterator<Item = &BrokenLinkRecord> {
        self.pages.iter().flat_map(|page| page.broken.iter())
    }
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(80);
        let thin = "-".repeat(80);

        writeln!(f, "{rule}")?;
        writeln!(f, "BROKEN LINK REPORT")?;
        writeln!(f, "{rule}")?;

        if self.has_broken_links() {
            writeln!(
                f,
                "Found {} broken links across {} pages.",
                self.broken_count(),
                self.pages.len()
            )?;
            writeln!(f)?;

            for page in &self.pages {
                writeln!(f, "Page: {}", page.page)?;
                for record in &page.broken {
                    writeln!(f, "  - {} ({})", record.broken_url, record.reason)?;
                }
                writeln!(f)?;
            }
        } else {
            writeln!(f, "No broken links found!")?;
        }

        writeln!(f, "{thin}")?;
        writeln!(f, "Total URLs crawled: {}", self.total_urls_crawled)?;
        writeln!(f, "External links found: {}", self.external_links_found)?;
        write!(f, "{thin}")
    }
}

#[derive(Debug, Default)]
struct ReportState {
    // (page, [(position on page, record)]) in first-recorded order
    pages: Vec<(String, Vec<(usize, BrokenLinkRecord)>)>,
    // page URL -> index into pages
    page_index: HashMap<String, usize>,
    total_urls_crawled: usize,
    external_links_found: usize,
}

/// Thread-safe accumulator shared by all workers of one run.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    state: Mutex<ReportState>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    // `position` is where `url` sits among `source_page`'s references
    pub fn record_broken(&self, source_page: &Url, position: usize, url: &Url, reason: BrokenReason) {
        let record = BrokenLinkRecord {
            source_page: source_page.to_string(),
            broken_url: url.to_string(),
            reason,
        };

        let mut state = self.state.lock();
        let ReportState {
            pages, page_index, ..
        } = &mut *state;
        let index = *page_index
            .entry(record.source_page.clone())
            .or_insert_with(|| {
                pages.push((record.source_page.clone(), Vec::new()));
                pages.len() - 1
            });
        pages[index].1.push((position, record));
    }

    pub fn record_crawled(&self, url: &Url, is_external: bool) {
        trace!(%url, is_external, "crawled");
        let mut state = self.state.lock();
        if is_external {
            state.external_links_found += 1;
        } else {
            state.total_urls_crawled += 1;
        }
    }

    // Takes the accumulated report; the aggregator is empty afterwards
    pub fn finalize(&self) -> CrawlReport {
        let state = std::mem::take(&mut *self.state.lock());

        let pages = state
            .pages
            .into_iter()
            .map(|(page, mut records)| {
                records.sort_by_key(|(position, _)| *position);
                PageReport {
                    page,
                    broken: records.into_iter().map(|(_, record)| record).collect(),
                }
            })
            .collect();

        CrawlReport {
            pages,
            total_urls_crawled: state.total_urls_crawled,
            external_links_found: state.external_links_found,
        }
    }
}
