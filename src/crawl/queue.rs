// src/crawl/queue.rs
// =============================================================================
// The shared work queue (Frontier) and de-duplication set (VisitedSet).
//
// Frontier
// - Many workers push and pop concurrently
// - pop() waits while the queue is empty but some worker is still busy,
//   because that worker may still push new work
// - The crawl is drained when the queue is empty AND nothing is in flight.
//   Every popped task is counted in flight until its TaskLease is dropped
//
// VisitedSet
// - Maps each canonical URL to its state: claimed and pending, or settled
//   with its final outcome
// - Claiming is an atomic test-and-set under one lock. Exactly one caller
//   wins a URL, so each URL is fetched at most once per run
// - Pages that reference a URL someone else already claimed still need a
//   broken-link record of their own. They either get the settled outcome
//   straight away, or wait in the pending entry until the fetch settles
// - A Referrer carries the link's position on its page, so records can be
//   put back into the page's own order however the fetches interleave
//
// Locks are parking_lot mutexes, held only for a few map/queue operations and
// never across an .await.
// =============================================================================

use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Notify;
use url::Url;

use super::policy::Scope;
use crate::checker::BrokenReason;

/// Where a link was found: the page, and the link's place among that page's
/// references (0-based, in document order after de-duplication).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Referrer {
    pub page: Url,
    pub position: usize,
}

impl Referrer {
    pub fn new(page: Url, position: usize) -> Self {
        Self { page, position }
    }
}

// One unit of work: fetch `url`, found on `referrer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,
    /// `None` for the seed
    pub referrer: Option<Referrer>,
    pub scope: Scope,
}

impl CrawlTask {
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            referrer: None,
            scope: Scope::ExpandAndCheck,
        }
    }

    pub fn discovered(url: Url, referrer: Referrer, scope: Scope) -> Self {
        Self {
            url,
            referrer: Some(referrer),
            scope,
        }
    }

    // The page a broken record for this task is filed under
    pub fn source_page(&self) -> &Url {
        self.referrer.as_ref().map_or(&self.url, |referrer| &referrer.page)
    }

    pub fn position(&self) -> usize {
        self.referrer.as_ref().map_or(0, |referrer| referrer.position)
    }
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<CrawlTask>,
    in_flight: usize,
    drained: bool,
}

#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, task: CrawlTask) {
        {
            let mut state = self.state.lock();
            if state.drained {
                // Only a worker holding a lease may push, and it keeps the
                // frontier alive, so this means a lease was dropped too early
                tracing::error!(url = %task.url, "task pushed after the frontier drained");
                return;
            }
            state.queue.push_back(task);
        }
        self.notify.notify_one();
    }

    // Next task, or `None` once the crawl is finished
    pub async fn pop(&self) -> Option<TaskLease<'_>> {
        loop {
            // Register interest before looking at the state, so a push or
            // completion between the check and the await can't be missed
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(task) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return Some(TaskLease {
                        frontier: self,
                        task,
                    });
                }
                if state.drained || state.in_flight == 0 {
                    state.drained = true;
                    drop(state);
                    self.notify.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    fn complete(&self) {
        let idle = {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.in_flight == 0 && state.queue.is_empty()
        };
        if idle {
            self.notify.notify_waiters();
        }
    }
}

/// A popped task. The frontier counts it as in flight until this is dropped,
/// which also covers a worker that panics mid-task.
#[derive(Debug)]
pub struct TaskLease<'a> {
    frontier: &'a Frontier,
    task: CrawlTask,
}

impl TaskLease<'_> {
    pub fn task(&self) -> &CrawlTask {
        &self.task
    }
}

impl Drop for TaskLease<'_> {
    fn drop(&mut self) {
        self.frontier.complete();
    }
}

// What a page learns when it tries to claim a URL it links to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// Nobody had it. The caller must enqueue it
    Won,
    /// Claimed by someone else and not fetched yet; the page is now waiting
    Pending,
    /// Already fetched; `Some` if it turned out broken
    Settled(Option<BrokenReason>),
}

#[derive(Debug)]
enum UrlState {
    Pending { waiting: Vec<Referrer> },
    Settled(Option<BrokenReason>),
}

#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashMap<String, UrlState>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    // Atomic test-and-set; true only for the single caller that wins `url`
    pub fn try_claim(&self, url: &Url) -> bool {
        match self.urls.lock().entry(url.as_str().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(UrlState::Pending { waiting: Vec::new() });
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    // Like `try_claim`, but a losing `referrer` is remembered so it gets told
    // whether the link is broken
    pub fn claim_for(&self, url: &Url, referrer: &Referrer) -> Claim {
        match self.urls.lock().entry(url.as_str().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(UrlState::Pending { waiting: Vec::new() });
                Claim::Won
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                UrlState::Pending { waiting } => {
                    waiting.push(referrer.clone());
                    Claim::Pending
                }
                UrlState::Settled(reason) => Claim::Settled(reason.clone()),
            },
        }
    }

    // Records the final outcome and hands back the pages that were waiting
    pub fn settle(&self, url: &Url, reason: Option<BrokenReason>) -> Vec<Referrer> {
        let previous = self
            .urls
            .lock()
            .insert(url.as_str().to_string(), UrlState::Settled(reason));

        match previous {
            Some(UrlState::Pending { waiting }) => waiting,
            _ => Vec::new(),
        }
    }

    // Settles `url` only if nobody has settled it yet. Returns the waiting
    // pages when it did, `None` when the URL was already settled (or unknown)
    pub fn settle_if_pending(&self, url: &Url, reason: Option<BrokenReason>) -> Option<Vec<Referrer>> {
        let mut urls = self.urls.lock();
        let state = urls.get_mut(url.as_str())?;
        match std::mem::replace(state, UrlState::Settled(reason)) {
            UrlState::Pending { waiting } => Some(waiting),
            settled @ UrlState::Settled(_) => {
                *state = settled;
                None
            }
        }
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.urls.lock().contains_key(url.as_str())
    }

    pub fn len(&self) -> usize {
        self.urls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.lock().is_empty()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a Mutex around the whole HashMap instead of "check, then insert"?
//    - Two workers could both see "not visited" and both insert
//    - entry() does the check and the insert under one lock, so only one
//      of them can ever get Entry::Vacant
//
// 2. What is tokio::sync::Notify?
//    - A way for one task to wake others without sending data
//    - notify_one() wakes a single waiting worker (new work arrived)
//    - notify_waiters() wakes all of them (the crawl is over)
//
// 3. Why does pop() call enable() before locking?
//    - It registers the worker as a waiter first
//    - If someone pushes between our check and our await, we still get woken
//
// 4. What is impl Drop?
//    - Code that runs when a value goes out of scope
//    - TaskLease uses it to mark the task finished, even if the worker panics
// -----------------------------------------------------------------------------
