// src/checker/markdown.rs
// =============================================================================
// This module extracts link destinations from Markdown text.
//
// Some static sites serve their docs as raw .md files. When the crawler lands
// on one of those, it scans it the same way it scans an HTML page: every
// [text](dest) link and ![alt](src) image becomes a raw reference.
//
// We use the `pulldown-cmark` crate which:
// - Parses Markdown into events (heading, paragraph, link, etc.)
// - Follows CommonMark
// - Resolves reference-style links ([text][id]) for us
//
// Inline HTML inside the Markdown (<a href>, <img src>) is handed to the HTML
// extractor.
// =============================================================================

use pulldown_cmark::{Event, Parser, Tag};

use super::html::extract_html_links;

// Extracts raw link and image destinations from Markdown, in document order
//
// Example input:
//   "See [the guide](./guide.md) and ![logo](img/logo.png)"
//
// Example output:
//   vec!["./guide.md", "img/logo.png"]
pub fn extract_markdown_links(markdown: &str) -> Vec<String> {
    let mut links = Vec::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Link(_link_type, dest_url, _title))
            | Event::Start(Tag::Image(_link_type, dest_url, _title)) => {
                let dest = dest_url.trim();
                if !dest.is_empty() {
                    links.push(dest.to_string());
                }
            }
            Event::Html(html) => links.extend(extract_html_links(&html)),
            _ => {}
        }
    }

    links
}
