use serde::Deserialize;

/// Default listing to start discovery from
pub const DEFAULT_SEED_URL: &str = "https://kydao.net";

/// Browser-like user agent; some hosts block obvious bots
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-AU,en;q=0.9,vi;q=0.8";

/// Marker inside a move list that stands for the board nonce
pub const DEFAULT_NONCE_PLACEHOLDER: &str = "{nonce}";

/// Main configuration structure for Kydao-Harvest
///
/// Every section is optional in the TOML file and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub detail: DetailConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Traversal configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Page whose player links seed the discovery queue
    #[serde(rename = "seed-url", default = "default_seed_url")]
    pub seed_url: String,

    /// Maximum listing pages walked per player
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: default_seed_url(),
            max_pages: default_max_pages(),
        }
    }
}

/// HTTP fetch behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per URL, including the first
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base of the exponential delay between attempts (seconds)
    #[serde(rename = "backoff-factor", default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

/// Game detail extraction
#[derive(Debug, Clone, Deserialize)]
pub struct DetailConfig {
    /// Substring of the move list replaced by the board nonce; empty disables substitution
    #[serde(rename = "nonce-placeholder", default = "default_nonce_placeholder")]
    pub nonce_placeholder: String,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            nonce_placeholder: default_nonce_placeholder(),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file; `None` runs without persistence
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,
}

fn default_seed_url() -> String {
    DEFAULT_SEED_URL.to_string()
}

fn default_max_pages() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    1.5
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_accept_language() -> String {
    DEFAULT_ACCEPT_LANGUAGE.to_string()
}

fn default_nonce_placeholder() -> String {
    DEFAULT_NONCE_PLACEHOLDER.to_string()
}
