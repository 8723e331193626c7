// src/config.rs
// =============================================================================
// The immutable configuration snapshot for one crawl run.
//
// The CLI (or any library caller) fills in a `CrawlOptions` value with raw,
// unvalidated input. `CrawlConfig::from_options` checks it and produces the
// `CrawlConfig` every component reads from. Once built, nothing mutates it.
//
// All validation happens here, before a single request goes out. A bad seed
// URL, a broken regex or conflicting domain modes are fatal; everything that
// goes wrong later during the crawl is just recorded in the report.
// =============================================================================

use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_THREADS: usize = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_USER_AGENT: &str = "BrokenLinkChecker/1.0";

/// Which hosts the crawler is allowed to recurse into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainMode {
    /// Only pages on the seed's host are scanned for further links.
    SameDomainOnly,
    /// Every reachable page is scanned.
    AllDomains,
    /// Only pages on one of these hosts are scanned.
    AllowedDomains(HashSet<String>),
}

// Errors that stop a crawl before it starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid seed URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("seed URL must use http or https, got '{0}'")]
    UnsupportedSeedScheme(String),

    #[error("seed URL has no host: {0}")]
    SeedWithoutHost(String),

    #[error("thread count must be at least 1")]
    NoThreads,

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid ignore pattern '{pattern}': {source}")]
    InvalidIgnorePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("--allowed-domains needs at least one domain")]
    EmptyAllowedDomains,

    #[error("--all-domains and --allowed-domains cannot be used together")]
    ConflictingDomainModes,
}

// Raw, unvalidated settings as a user typed them
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub seed: String,
    pub max_threads: usize,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    pub user_agent: Option<String>,
    pub all_domains: bool,
    pub allowed_domains: Vec<String>,
    pub ignore_patterns: Vec<String>,
}

impl CrawlOptions {
    /// Options for `seed` with every other setting at its default.
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            max_threads: DEFAULT_THREADS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            user_agent: None,
            all_domains: false,
            allowed_domains: Vec::new(),
            ignore_patterns: Vec::new(),
        }
    }
}

/// Validated, read-only configuration shared by every component of a run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed: Url,
    pub max_threads: usize,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
    pub domain_mode: DomainMode,
    /// Checked in this order; the first match wins.
    pub ignore_patterns: Vec<Regex>,
}

impl CrawlConfig {
    pub fn from_options(options: CrawlOptions) -> Result<Self, ConfigError> {
        let mut seed = Url::parse(options.seed.trim()).map_err(|source| ConfigError::InvalidSeed {
            url: options.seed.clone(),
            source,
        })?;

        if !matches!(seed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedSeedScheme(seed.scheme().to_string()));
        }
        if seed.host_str().is_none() {
            return Err(ConfigError::SeedWithoutHost(options.seed));
        }
        // The seed is a canonical URL like any other
        seed.set_fragment(None);

        if options.max_threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        if options.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let domain_mode = domain_mode(options.all_domains, &options.allowed_domains)?;

        let ignore_patterns = options
            .ignore_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidIgnorePattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            seed,
            max_threads: options.max_threads,
            timeout: options.timeout,
            retries: options.retries,
            retry_delay: options.retry_delay,
            user_agent: options
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            domain_mode,
            ignore_patterns,
        })
    }

    // Host of the seed URL, lowercased by the url crate
    pub fn seed_host(&self) -> &str {
        self.seed.host_str().unwrap_or_default()
    }
}

fn domain_mode(all_domains: bool, allowed: &[String]) -> Result<DomainMode, ConfigError> {
    // Each --allowed-domains value may itself be a comma separated list
    let hosts: HashSet<String> = allowed
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(|host| host.trim().to_ascii_lowercase())
        .filter(|host| !host.is_empty())
        .collect();

    match (all_domains, allowed.is_empty()) {
        (true, false) => Err(ConfigError::ConflictingDomainModes),
        (true, true) => Ok(DomainMode::AllDomains),
        (false, true) => Ok(DomainMode::SameDomainOnly),
        (false, false) if hosts.is_empty() => Err(ConfigError::EmptyAllowedDomains),
        (false, false) => Ok(DomainMode::AllowedDomains(hosts)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::from_options(CrawlOptions::new("https://example.com/#top")).unwrap();
        assert_eq!(config.seed.as_str(), "https://example.com/");
        assert_eq!(config.seed_host(), "example.com");
        assert_eq!(config.max_threads, 5);
        assert_eq!(config.retries, 2);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.user_agent, "BrokenLinkChecker/1.0");
        assert_eq!(config.domain_mode, DomainMode::SameDomainOnly);
    }

    #[test]
    fn test_conflicting_domain_modes() {
        let mut options = CrawlOptions::new("https://example.com");
        options.all_domains = true;
        options.allowed_domains = vec!["example.com".into()];
        let err = CrawlConfig::from_options(options).unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingDomainModes));
    }

    #[test]
    fn test_allowed_domains_split_and_lowercased() {
        let mut options = CrawlOptions::new("https://example.com");
        options.allowed_domains = vec!["Docs.Example.com, cdn.example.com".into(), "blog.example.com".into()];
        let config = CrawlConfig::from_options(options).unwrap();
        let DomainMode::AllowedDomains(hosts) = config.domain_mode else {
            panic!("expected allowed domains");
        };
        assert_eq!(hosts.len(), 3);
        assert!(hosts.contains("docs.example.com"));
    }

    #[test]
    fn test_blank_allowed_domains_rejected() {
        let mut options = CrawlOptions::new("https://example.com");
        options.allowed_domains = vec![" , ".into()];
        assert!(matches!(
            CrawlConfig::from_options(options),
            Err(ConfigError::EmptyAllowedDomains)
        ));
    }

    #[test]
    fn test_bad_ignore_pattern() {
        let mut options = CrawlOptions::new("https://example.com");
        options.ignore_patterns = vec!["ok".into(), "(unclosed".into()];
        match CrawlConfig::from_options(options) {
            Err(ConfigError::InvalidIgnorePattern { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_seed_validation() {
        assert!(matches!(
            CrawlConfig::from_options(CrawlOptions::new("not a url")),
            Err(ConfigError::InvalidSeed { .. })
        ));
        assert!(matches!(
            CrawlConfig::from_options(CrawlOptions::new("ftp://example.com/")),
            Err(ConfigError::UnsupportedSeedScheme(_))
        ));

        let mut options = CrawlOptions::new("https://example.com");
        options.max_threads = 0;
        assert!(matches!(CrawlConfig::from_options(options), Err(ConfigError::NoThreads)));
    }
}
