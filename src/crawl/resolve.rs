// src/crawl/resolve.rs
// =============================================================================
// Turns raw references found on a page into canonical absolute URLs.
//
// Rules:
// - Relative, path-relative and protocol-relative (//host/x) references are
//   joined against the page URL with standard URL resolution
// - The fragment is dropped; the query string is kept
// - Only http and https survive. mailto:, tel:, javascript:, data: and
//   anything else are rejected
// - A URL matching any ignore pattern is rejected too
//
// A rejection is a filtering decision, not an error. Rejected references are
// never fetched and never reported.
//
// Markdown handling lives here as well: a reference to `page.md` may be served
// as `page.md`, as `page`, or rendered as `page.html`. `markdown_candidates`
// lists those variants in the order the fetcher should try them.
// =============================================================================

use regex::Regex;
use url::Url;

// Why a reference was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Unparsable,
    UnsupportedScheme(String),
    Ignored(String),
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    ignore_patterns: Vec<Regex>,
}

impl Resolver {
    pub fn new(ignore_patterns: Vec<Regex>) -> Self {
        Self { ignore_patterns }
    }

    // Resolves `raw` against `base` into a canonical absolute URL
    //
    // Examples (base = https://example.com/docs/page):
    //   "/about"            -> https://example.com/about
    //   "../img/a.png"      -> https://example.com/img/a.png
    //   "//cdn.net/x.js"    -> https://cdn.net/x.js
    //   "?page=2#top"       -> https://example.com/docs/page?page=2
    //   "mailto:me@x.com"   -> Rejected
    pub fn resolve(&self, base: &Url, raw: &str) -> Result<Url, Rejection> {
        let mut url = base.join(raw.trim()).map_err(|_| Rejection::Unparsable)?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Rejection::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.host_str().is_none() {
            return Err(Rejection::Unparsable);
        }

        url.set_fragment(None);

        if let Some(pattern) = self.ignored_by(&url) {
            return Err(Rejection::Ignored(pattern.to_string()));
        }

        Ok(url)
    }

    // First ignore pattern matching the URL, in configured order
    fn ignored_by(&self, url: &Url) -> Option<&str> {
        self.ignore_patterns
            .iter()
            .find(|pattern| pattern.is_match(url.as_str()))
            .map(Regex::as_str)
    }
}

// The URLs to try for a reference, in order
//
// For anything not ending in .md this is just the URL itself. For
// https://example.com/guide.md?v=1 it is:
//   https://example.com/guide.md?v=1
//   https://example.com/guide?v=1
//   https://example.com/guide.html?v=1
pub fn markdown_candidates(url: &Url) -> Vec<Url> {
    let path = url.path();
    let stem_len = path.len().saturating_sub(3);

    if !path.is_char_boundary(stem_len) || !path[stem_len..].eq_ignore_ascii_case(".md") {
        return vec![url.clone()];
    }

    let stem = &path[..stem_len];
    let mut candidates = vec![url.clone()];
    for replacement in [stem.to_string(), format!("{stem}.html")] {
        let mut candidate = url.clone();
        candidate.set_path(&replacement);
        candidates.push(candidate);
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/page").unwrap()
    }

    fn resolve(raw: &str) -> Result<String, Rejection> {
        Resolver::default().resolve(&base(), raw).map(String::from)
    }

    #[test]
    fn test_resolve_absolute_link() {
        assert_eq!(resolve("https://other.com"), Ok("https://other.com/".to_string()));
    }

    #[test]
    fn test_resolve_relative_forms() {
        assert_eq!(resolve("/about"), Ok("https://example.com/about".to_string()));
        assert_eq!(resolve("intro"), Ok("https://example.com/docs/intro".to_string()));
        assert_eq!(resolve("../img/a.png"), Ok("https://example.com/img/a.png".to_string()));
        assert_eq!(resolve("//cdn.net/x.js"), Ok("https://cdn.net/x.js".to_string()));
    }

    #[test]
    fn test_fragment_stripped_query_kept() {
        assert_eq!(
            resolve("/list?page=2#results"),
            Ok("https://example.com/list?page=2".to_string())
        );
        assert_eq!(resolve("#section"), Ok("https://example.com/docs/page".to_string()));
        assert_ne!(resolve("/list?page=2"), resolve("/list?page=3"));
    }

    #[test]
    fn test_non_http_schemes_rejected() {
        for raw in [
            "mailto:test@example.com",
            "tel:+123456",
            "javascript:void(0)",
            "data:image/png;base64,AAAA",
            "ftp://files.example.com/x",
        ] {
            assert!(
                matches!(resolve(raw), Err(Rejection::UnsupportedScheme(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_unparsable_rejected() {
        assert_eq!(resolve("http://"), Err(Rejection::Unparsable));
        assert_eq!(resolve("https://exa mple.com/"), Err(Rejection::Unparsable));
    }

    #[test]
    fn test_ignore_patterns_checked_after_resolution() {
        let resolver = Resolver::new(vec![
            Regex::new(r"/private/").unwrap(),
            Regex::new(r"\.pdf$").unwrap(),
        ]);
        assert_eq!(
            resolver.resolve(&base(), "../private/x"),
            Err(Rejection::Ignored("/private/".to_string()))
        );
        assert_eq!(
            resolver.resolve(&base(), "report.pdf#p3"),
            Err(Rejection::Ignored(r"\.pdf$".to_string()))
        );
        assert!(resolver.resolve(&base(), "public/x").is_ok());
    }

    #[test]
    fn test_markdown_candidates() {
        let url = Url::parse("https://example.com/guide/setup.md?v=1").unwrap();
        let candidates: Vec<String> = markdown_candidates(&url).into_iter().map(String::from).collect();
        assert_eq!(
            candidates,
            vec![
                "https://example.com/guide/setup.md?v=1",
                "https://example.com/guide/setup?v=1",
                "https://example.com/guide/setup.html?v=1",
            ]
        );
    }

    #[test]
    fn test_markdown_candidates_case_insensitive() {
        let url = Url::parse("https://example.com/README.MD").unwrap();
        assert_eq!(markdown_candidates(&url).len(), 3);
    }

    #[test]
    fn test_non_markdown_has_single_candidate() {
        for raw in ["https://example.com/page", "https://example.com/cmd", "https://example.com/"] {
            let url = Url::parse(raw).unwrap();
            assert_eq!(markdown_candidates(&url), vec![url]);
        }
    }
}
