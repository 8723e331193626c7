// src/checker/html.rs
// =============================================================================
// This module pulls link-like references out of HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever, which never rejects input: malformed markup is
//   repaired the way a browser would repair it
//
// What we collect:
// - <a href>, <link href>          (pages, stylesheets)
// - <img src>, <script src>, <iframe src>
//
// The strings come back raw, exactly as written in the page. Resolving them
// against the page URL is the crawler's job, not ours.
// =============================================================================

use scraper::{Html, Selector};
use tracing::warn;

// Every element/attribute pair that can point at another resource
const REFERENCE_ATTRIBUTES: &[(&str, &str)] = &[
    ("a", "href"),
    ("link", "href"),
    ("img", "src"),
    ("script", "src"),
    ("iframe", "src"),
];

// Extracts raw reference strings from HTML content, in document order
//
// Example:
//   html = "<a href='/docs'>Docs</a><img src='logo.png'>"
//   result = ["/docs", "logo.png"]
pub fn extract_html_links(html: &str) -> Vec<String> {
    let selector_text = REFERENCE_ATTRIBUTES
        .iter()
        .map(|(tag, attr)| format!("{tag}[{attr}]"))
        .collect::<Vec<_>>()
        .join(", ");

    let selector = match Selector::parse(&selector_text) {
        Ok(selector) => selector,
        Err(e) => {
            warn!("invalid reference selector '{}': {:?}", selector_text, e);
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);

    document
        .select(&selector)
        .filter_map(|element| {
            let name = element.value().name();
            REFERENCE_ATTRIBUTES
                .iter()
                .find(|(tag, _)| *tag == name)
                .and_then(|(_, attr)| element.value().attr(attr))
        })
        .map(str::trim)
        .filter(|reference| !reference.is_empty())
        .map(str::to_string)
        .collect()
}
