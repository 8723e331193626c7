// src/crawl/cache.rs
// =============================================================================
// Per-run memo of fetch outcomes, keyed by URL.
//
// A Markdown reference is checked through up to three candidate URLs, and any
// of those candidates may also be linked directly from some page. Every fetch
// in a run goes through this cache, so a URL hits the network at most once
// however it was reached.
//
// - Concurrent callers for the same URL share one request: the first one
//   fetches, the others await the same OnceCell
// - Only the caller that did the fetch gets the body. The cached copy keeps
//   status and final URL but no body, so a page is never scanned twice
// =============================================================================

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::checker::{FetchOutcome, Fetcher, Transport};

#[derive(Debug, Default)]
pub struct FetchCache {
    outcomes: Mutex<HashMap<String, Arc<OnceCell<FetchOutcome>>>>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    // Fetches `url` through `fetcher` unless this run already has its outcome
    pub async fn fetch<T: Transport>(&self, fetcher: &Fetcher<T>, url: &Url, read_body: bool) -> FetchOutcome {
        let cell = Arc::clone(
            self.outcomes
                .lock()
                .entry(url.as_str().to_string())
                .or_default(),
        );

        let mut fresh = None;
        let slot = &mut fresh;
        let cached = cell
            .get_or_init(|| async move {
                let outcome = fetcher.fetch(url, read_body).await;
                let kept = outcome.without_body();
                *slot = Some(outcome);
                kept
            })
            .await;

        match fresh {
            Some(outcome) => outcome,
            None => {
                debug!(%url, "already fetched this run, reusing outcome");
                cached.clone()
            }
        }
    }

    // Tries each candidate in order, each with its own retry budget, and stops
    // at the first success.
    //
    // Returns the outcome to record for the reference: the first success, or,
    // if every candidate failed, the outcome of the first (unchanged) URL.
    pub async fn fetch_first_reachable<T: Transport>(
        &self,
        fetcher: &Fetcher<T>,
        candidates: &[Url],
        read_body: bool,
    ) -> FetchOutcome {
        let mut first_failure = None;

        for candidate in candidates {
            let outcome = self.fetch(fetcher, candidate, read_body).await;
            if outcome.is_ok() {
                return outcome;
            }
            debug!(url = %candidate, "candidate failed: {:?}", outcome);
            if first_failure.is_none() {
                first_failure = Some(outcome);
            }
        }

        first_failure.unwrap_or_else(|| FetchOutcome::ConnectionFailure("no URL to fetch".to_string()))
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.lock().is_empty()
    }
}
