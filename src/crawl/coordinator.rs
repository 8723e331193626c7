// src/crawl/coordinator.rs
// =============================================================================
// The worker pool that drives a crawl from the seed URL to a finished report.
//
// How it works:
// 1. Claim the seed in the VisitedSet and push it onto the Frontier
// 2. Spawn `max_threads` workers. Each one loops:
//      pop a task -> fetch it (retries, Markdown variants) -> record the result
//      -> if it is an in-scope page, extract references -> resolve, classify
//      and claim each one -> push the ones this worker won
// 3. When the Frontier reports drained (empty queue, nothing in flight) every
//    worker returns. We join them all and finalize the report.
//
// Each run builds its own Frontier, VisitedSet, FetchCache and
// ResultAggregator, so a Crawler can be run more than once without anything
// leaking between runs.
//
// A task whose check never finishes (its worker panicked) is still settled,
// as broken, so every page waiting on that URL gets its record.
//
// No lock is held while a worker waits on the network or sleeps between
// retries; the shared structures only lock inside their own methods.
// =============================================================================

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use super::cache::FetchCache;
use super::policy::{classify, is_external, Scope};
use super::queue::{Claim, CrawlTask, Frontier, Referrer, VisitedSet};
use super::resolve::{markdown_candidates, Resolver};
use crate::checker::{
    extract_links, BrokenReason, ContentKind, FetchOutcome, Fetcher, RetryPolicy, Transport,
};
use crate::config::CrawlConfig;
use crate::report::{CrawlReport, ResultAggregator};

pub struct Crawler<T> {
    config: Arc<CrawlConfig>,
    fetcher: Arc<Fetcher<T>>,
}

impl<T> Crawler<T>
where
    T: Transport + 'static,
{
    pub fn new(config: CrawlConfig, transport: T) -> Self {
        let fetcher = Fetcher::new(transport, RetryPolicy::from_config(&config));
        Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
        }
    }

    // Crawls until the frontier is drained and returns the finished report.
    // Individual failures end up in the report; nothing here can fail the run.
    pub async fn run(&self) -> CrawlReport {
        let run = Arc::new(CrawlRun {
            config: Arc::clone(&self.config),
            fetcher: Arc::clone(&self.fetcher),
            resolver: Resolver::new(self.config.ignore_patterns.clone()),
            frontier: Frontier::new(),
            visited: VisitedSet::new(),
            cache: FetchCache::new(),
            results: ResultAggregator::new(),
        });

        // The seed skips the resolver, so ignore patterns never apply to it
        let seed = self.config.seed.clone();
        run.visited.try_claim(&seed);
        run.frontier.push(CrawlTask::seed(seed));

        info!(
            seed = %self.config.seed,
            workers = self.config.max_threads,
            mode = ?self.config.domain_mode,
            "starting crawl"
        );

        let workers = (0..self.config.max_threads).map(|id| {
            let run = Arc::clone(&run);
            tokio::spawn(async move { run.work(id).await })
        });

        for joined in join_all(workers).await {
            if let Err(e) = joined {
                error!("crawl worker stopped abnormally: {}", e);
            }
        }

        let report = run.results.finalize();
        info!(
            crawled = report.total_urls_crawled,
            external = report.external_links_found,
            broken = report.broken_count(),
            "crawl finished"
        );
        report
    }
}

// Everything one run's workers share
struct CrawlRun<T> {
    config: Arc<CrawlConfig>,
    fetcher: Arc<Fetcher<T>>,
    resolver: Resolver,
    frontier: Frontier,
    visited: VisitedSet,
    cache: FetchCache,
    results: ResultAggregator,
}

// Settles a task's URL on drop if processing never got that far
struct Unfinished<'a, T> {
    run: &'a CrawlRun<T>,
    task: &'a CrawlTask,
}

impl<T> Drop for Unfinished<'_, T> {
    fn drop(&mut self) {
        self.run.abandon(self.task);
    }
}

impl<T> CrawlRun<T> {
    fn record_for_all(&self, task: &CrawlTask, waiting: Vec<Referrer>, reason: BrokenReason) {
        self.results
            .record_broken(task.source_page(), task.position(), &task.url, reason.clone());
        for referrer in waiting {
            self.results
                .record_broken(&referrer.page, referrer.position, &task.url, reason.clone());
        }
    }

    // No-op when the task was settled normally
    fn abandon(&self, task: &CrawlTask) {
        let reason = BrokenReason::ConnectionFailure("check did not complete".to_string());
        let Some(waiting) = self.visited.settle_if_pending(&task.url, Some(reason.clone())) else {
            return;
        };
        error!(url = %task.url, waiting = waiting.len(), "check did not complete, reporting as broken");
        self.record_for_all(task, waiting, reason);
    }
}

impl<T: Transport> CrawlRun<T> {
    async fn work(&self, id: usize) {
        debug!(worker = id, "worker started");
        let mut processed = 0usize;

        // The lease keeps the task counted as in flight until it is dropped
        while let Some(lease) = self.frontier.pop().await {
            // Dropped before the lease, so the URL is settled while the task
            // still counts as in flight
            let _unfinished = Unfinished {
                run: self,
                task: lease.task(),
            };
            self.process(lease.task()).await;
            processed += 1;
        }

        debug!(worker = id, processed, "worker finished");
    }

    async fn process(&self, task: &CrawlTask) {
        info!(url = %task.url, scope = ?task.scope, "Checking");

        let expand = task.scope.expands();
        let candidates = markdown_candidates(&task.url);
        let outcome = self
            .cache
            .fetch_first_reachable(&self.fetcher, &candidates, expand)
            .await;

        self.results
            .record_crawled(&task.url, is_external(&task.url, &self.config));

        // Settle before recording, so pages that find this URL from now on
        // get the outcome directly instead of waiting
        let broken = outcome.broken_reason();
        let waiting = self.visited.settle(&task.url, broken.clone());

        if let Some(reason) = broken {
            warn!(url = %task.url, source = %task.source_page(), "broken link ({})", reason);
            self.record_for_all(task, waiting, reason);
            return;
        }

        if !expand {
            return;
        }

        if let FetchOutcome::Success {
            final_url,
            content_type,
            body: Some(body),
            ..
        } = outcome
        {
            self.expand(&task.url, &final_url, content_type.as_deref(), &body);
        }
    }

    // Scans a fetched page and queues every reference this worker claims.
    //
    // `page` is the URL the page is known by (and reported under); `base` is
    // where it actually came from after redirects, which relative references
    // resolve against.
    fn expand(&self, page: &Url, base: &Url, content_type: Option<&str>, body: &str) {
        let Some(kind) = ContentKind::detect(content_type, base) else {
            return;
        };

        let mut seen = HashSet::new();
        for raw in extract_links(kind, body) {
            let url = match self.resolver.resolve(base, &raw) {
                Ok(url) => url,
                Err(rejection) => {
                    trace!(%page, reference = %raw, "skipping reference: {:?}", rejection);
                    continue;
                }
            };

            // A page gets one record per broken URL, however often it links it.
            // Positions count distinct references in document order
            let position = seen.len();
            if seen.insert(url.as_str().to_string()) {
                self.discover(Referrer::new(page.clone(), position), url);
            }
        }

        debug!(%page, references = seen.len(), "page scanned");
    }

    fn discover(&self, referrer: Referrer, url: Url) {
        let scope = classify(&url, &self.config);
        if scope == Scope::Skip {
            return;
        }

        match self.visited.claim_for(&url, &referrer) {
            Claim::Won => self
                .frontier
                .push(CrawlTask::discovered(url, referrer, scope)),
            Claim::Pending | Claim::Settled(None) => {}
            Claim::Settled(Some(reason)) => {
                self.results
                    .record_broken(&referrer.page, referrer.position, &url, reason)
            }
        }
    }
}
