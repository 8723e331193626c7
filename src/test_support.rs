// src/test_support.rs
// =============================================================================
// A scripted, request-counting Transport for unit tests.
//
// Routes are keyed by exact URL string. Unknown URLs answer 404, like a real
// server would. Every request is counted so tests can assert how often a URL
// was fetched. A route can also be slowed down on its own, or made to panic
// mid-request.
// =============================================================================

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::checker::{ContentKind, Transport, TransportError, TransportResponse};

#[derive(Debug, Clone)]
struct Route {
    // Answer n is used for hit n; the last one repeats
    answers: Vec<Result<u16, TransportError>>,
    content_type: Option<String>,
    body: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    routes: Mutex<HashMap<String, Route>>,
    hits: Mutex<HashMap<String, usize>>,
    latency: Mutex<Option<Duration>>,
    delays: Mutex<HashMap<String, Duration>>,
    panics: Mutex<HashSet<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<Inner>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(self, url: &str, route: Route) -> Self {
        self.inner.routes.lock().insert(url.to_string(), route);
        self
    }

    pub fn status(self, url: &str, status: u16) -> Self {
        self.sequence(url, vec![Ok(status)])
    }

    pub fn failure(self, url: &str, error: TransportError) -> Self {
        self.sequence(url, vec![Err(error)])
    }

    pub fn sequence(self, url: &str, answers: Vec<Result<u16, TransportError>>) -> Self {
        self.route(
            url,
            Route {
                answers,
                content_type: None,
                body: None,
            },
        )
    }

    pub fn html(self, url: &str, body: &str) -> Self {
        self.document(url, "text/html; charset=utf-8", body)
    }

    pub fn document(self, url: &str, content_type: &str, body: &str) -> Self {
        self.route(
            url,
            Route {
                answers: vec![Ok(200)],
                content_type: Some(content_type.to_string()),
                body: Some(body.to_string()),
            },
        )
    }

    // Each request sleeps this long, so concurrent workers overlap
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.inner.latency.lock() = Some(latency);
        self
    }

    // Extra sleep for one URL, on top of any global latency
    pub fn delay(self, url: &str, delay: Duration) -> Self {
        self.inner.delays.lock().insert(url.to_string(), delay);
        self
    }

    // Requests for `url` panic after their latency
    pub fn panicking(self, url: &str) -> Self {
        self.inner.panics.lock().insert(url.to_string());
        self
    }

    pub fn hits(&self, url: &str) -> usize {
        self.inner.hits.lock().get(url).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.inner.hits.lock().values().sum()
    }

    async fn answer(&self, url: &Url, read_body: bool) -> Result<TransportResponse, TransportError> {
        let hit = {
            let mut hits = self.inner.hits.lock();
            let count = hits.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count - 1
        };

        let latency = *self.inner.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let delay = self.inner.delays.lock().get(url.as_str()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.inner.panics.lock().contains(url.as_str()) {
            panic!("scripted transport told to panic on {url}");
        }

        let route = self.inner.routes.lock().get(url.as_str()).cloned();
        let Some(route) = route else {
            return Ok(TransportResponse {
                status: 404,
                final_url: url.clone(),
                content_type: None,
                body: None,
            });
        };

        let answer = route.answers[hit.min(route.answers.len() - 1)].clone();
        let status = answer?;
        let scannable = ContentKind::detect(route.content_type.as_deref(), url).is_some();

        Ok(TransportResponse {
            status,
            final_url: url.clone(),
            body: route.body.filter(|_| read_body && scannable && status < 400),
            content_type: route.content_type,
        })
    }
}

impl Transport for ScriptedTransport {
    fn get<'a>(
        &'a self,
        url: &'a Url,
        read_body: bool,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        Box::pin(self.answer(url, read_body))
    }
}
