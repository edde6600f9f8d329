use crate::search::SearchOptions;
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Backscroll
///
/// Every table is optional; a missing table takes its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,

    #[serde(default)]
    pub lookup: LookupConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// A stored search; command-line values take precedence
    #[serde(default)]
    pub search: SearchConfig,
}

/// The `[search]` table: structured options plus date bounds and traversal mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearchConfig {
    #[serde(flatten)]
    pub options: SearchOptions,

    /// Lower bound, in any form `SearchDate` accepts
    pub since: Option<String>,

    /// Upper bound, in any form `SearchDate` accepts
    pub until: Option<String>,

    #[serde(default)]
    pub daily: bool,

    #[serde(default)]
    pub chronological: bool,
}

/// How a fetcher picks its identity string from the configured list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityPolicy {
    /// Uniformly random, chosen once per fetcher
    #[default]
    Random,

    /// Always the first entry
    First,
}

/// Listing fetcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetcherConfig {
    /// Endpoint serving the first page of a search
    pub search_url: String,

    /// Endpoint serving every page after the first
    pub timeline_url: String,

    /// Identity strings sent as `User-Agent`
    pub user_agents: Vec<String>,

    pub identity_policy: IdentityPolicy,

    /// Upper bound of the random pause between pages (milliseconds)
    pub max_politeness_delay_ms: u64,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            search_url: "https://twitter.com/search".to_string(),
            timeline_url: "https://twitter.com/i/search/timeline".to_string(),
            user_agents: [
                "Opera/9.80 (X11; Linux x86_64; U; fr) Presto/2.9.168 Version/11.50",
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)",
                "Mozilla/5.0 (X11; Linux i686; rv:10.0) Gecko/20100101 Firefox/10.0",
                "Mozilla/5.0 (X11; Linux x86_64; rv:10.0) Gecko/20100101 Firefox/10.0",
                "Mozilla/5.0 (X11; Linux i686 on x86_64; rv:10.0) Gecko/20100101 Firefox/10.0",
            ]
            .iter()
            .map(|agent| agent.to_string())
            .collect(),
            identity_policy: IdentityPolicy::Random,
            max_politeness_delay_ms: 1000,
            timeout_secs: 30,
        }
    }
}

/// Batched look-up configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LookupConfig {
    pub endpoint: String,

    /// Identifiers per call (the endpoint accepts at most 100)
    pub batch_size: usize,

    /// Pause before every call (milliseconds)
    pub delay_ms: u64,

    pub timeout_secs: u64,

    /// TOML file holding bearer tokens by profile
    pub credentials_path: Option<PathBuf>,

    /// Profile to read from the credentials file
    pub profile: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.twitter.com/1.1/statuses/lookup.json".to_string(),
            batch_size: 100,
            delay_ms: 4000,
            timeout_secs: 30,
            credentials_path: None,
            profile: "default".to_string(),
        }
    }
}

/// Stage wiring configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PipelineConfig {
    /// Bound of each hand-off queue
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
        }
    }
}
