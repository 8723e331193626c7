// src/crawl/policy.rs
// =============================================================================
// Decides what the crawler does with a resolved URL.
//
// - ExpandAndCheck: fetch it, and if it is a page, scan it for more links
// - CheckOnly: fetch it to make sure it is reachable, never scan it
// - Skip: do nothing
//
// Off-scope links are still checked, so rot on external sites gets caught,
// but the crawler never wanders off across the whole web.
// =============================================================================

use url::Url;

use crate::config::{CrawlConfig, DomainMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    ExpandAndCheck,
    CheckOnly,
    Skip,
}

impl Scope {
    pub fn expands(self) -> bool {
        self == Self::ExpandAndCheck
    }
}

// Pure function of (url, config): same inputs, same answer
pub fn classify(url: &Url, config: &CrawlConfig) -> Scope {
    let Some(host) = url.host_str() else {
        return Scope::Skip;
    };

    let in_scope = match &config.domain_mode {
        DomainMode::SameDomainOnly => host == config.seed_host(),
        DomainMode::AllDomains => true,
        DomainMode::AllowedDomains(hosts) => hosts.contains(host),
    };

    if in_scope {
        Scope::ExpandAndCheck
    } else {
        Scope::CheckOnly
    }
}

// Whether `url` lives on a different host than the seed, whatever the mode.
// Only used for the report's statistics.
pub fn is_external(url: &Url, config: &CrawlConfig) -> bool {
    url.host_str() != Some(config.seed_host())
}
