// src/checker/mod.rs
// =============================================================================
// Everything that happens to a single URL: fetching it, classifying the
// result, and pulling references out of the body.
//
// Submodules:
// - http: Transport, FetchOutcome, RetryPolicy and the Fetcher
// - html: Extracts raw references from HTML pages
// - markdown: Extracts raw references from Markdown pages
// =============================================================================

mod html;
mod http;
mod markdown;

pub use html::extract_html_links;
pub use http::{
    BrokenReason, ContentKind, FetchOutcome, Fetcher, ReqwestTransport, RetryPolicy, Transport,
    TransportError, TransportResponse, MAX_REDIRECTS,
};
pub use markdown::extract_markdown_links;

// Raw references found in a fetched body of the given kind
pub fn extract_links(kind: ContentKind, body: &str) -> Vec<String> {
    match kind {
        ContentKind::Html => extract_html_links(body),
        ContentKind::Markdown => extract_markdown_links(body),
    }
}
