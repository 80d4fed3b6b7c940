//! Process-wide configuration, resolved once from the environment.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{ResearchError, ResearchResult};

/// Default model used for extraction, synthesis and analysis.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature for extraction and synthesis.
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.1;

/// Default sampling temperature for prose analysis.
pub const DEFAULT_ANALYSIS_TEMPERATURE: f32 = 0.3;

/// Default token budget per model call.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Default LLM request timeout in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Default number of companies per query.
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 10;

/// Default number of scrapes in flight per discovery batch.
pub const DEFAULT_MAX_SCRAPING_CONCURRENT: usize = 5;

/// Default per-scrape timeout in seconds.
pub const DEFAULT_SCRAPING_TIMEOUT_SECS: u64 = 30;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default Firecrawl API base.
pub const DEFAULT_FIRECRAWL_BASE_URL: &str = "https://api.firecrawl.dev/v1";

/// Domains searched by default.
pub const DEFAULT_INCLUDE_DOMAINS: &[&str] = &[
    "github.com",
    "docs.mongodb.com",
    "www.postgresql.org",
    "redis.io",
    "cassandra.apache.org",
    "www.docker.com",
    "kubernetes.io",
    "aws.amazon.com",
    "cloud.google.com",
    "azure.microsoft.com",
    "www.elastic.co",
    "www.splunk.com",
    "grafana.com",
    "prometheus.io",
];

/// Immutable settings shared by every component.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// OpenAI API key.
    pub openai_api_key: String,
    /// Firecrawl API key.
    pub firecrawl_api_key: String,
    /// Model identifier.
    pub llm_model: String,
    /// Temperature for extraction and synthesis.
    pub llm_temperature: f32,
    /// Temperature for analysis, comparison and recommendations.
    pub analysis_temperature: f32,
    /// Max tokens per model call.
    pub max_tokens: u32,
    /// LLM request timeout in seconds.
    pub llm_timeout_secs: u64,
    /// Companies returned per query when the caller does not say.
    pub max_search_results: usize,
    /// Scrapes in flight per batch.
    pub max_scraping_concurrent: usize,
    /// Per-scrape timeout in seconds.
    pub scraping_timeout_secs: u64,
    /// Domains the search step may return. Empty means unrestricted.
    pub include_domains: Vec<String>,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Override for the OpenAI API base.
    pub openai_base_url: Option<String>,
    /// Firecrawl API base.
    pub firecrawl_base_url: String,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            firecrawl_api_key: String::new(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_temperature: DEFAULT_LLM_TEMPERATURE,
            analysis_temperature: DEFAULT_ANALYSIS_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            max_search_results: DEFAULT_MAX_SEARCH_RESULTS,
            max_scraping_concurrent: DEFAULT_MAX_SCRAPING_CONCURRENT,
            scraping_timeout_secs: DEFAULT_SCRAPING_TIMEOUT_SECS,
            include_domains: DEFAULT_INCLUDE_DOMAINS
                .iter()
                .map(|d| (*d).to_string())
                .collect(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            openai_base_url: None,
            firecrawl_base_url: DEFAULT_FIRECRAWL_BASE_URL.to_string(),
        }
    }
}

impl ResearchConfig {
    /// Load and validate configuration from environment variables.
    ///
    /// # Required Environment Variables
    /// - `OPENAI_API_KEY`
    /// - `FIRECRAWL_API_KEY`
    ///
    /// # Optional Environment Variables
    /// - `LLM_MODEL`, `LLM_TEMPERATURE`, `ANALYSIS_TEMPERATURE`, `MAX_TOKENS`, `LLM_TIMEOUT`
    /// - `MAX_SEARCH_RESULTS`, `MAX_SCRAPING_CONCURRENT`, `SCRAPING_TIMEOUT`
    /// - `INCLUDE_DOMAINS` (comma separated, empty for no restriction)
    /// - `LOG_LEVEL`, `OPENAI_BASE_URL`, `FIRECRAWL_BASE_URL`
    pub fn from_env() -> ResearchResult<Self> {
        let config = Self::load();
        config.validate()?;
        Ok(config)
    }

    /// Read the environment without checking credentials.
    ///
    /// Health checks use this so a missing key is reported, not raised.
    pub fn load() -> Self {
        let defaults = Self::default();

        let include_domains = match std::env::var("INCLUDE_DOMAINS") {
            Ok(raw) => parse_domain_list(&raw),
            Err(_) => defaults.include_domains,
        };
        let concurrency = env_parse("MAX_SCRAPING_CONCURRENT", defaults.max_scraping_concurrent);

        Self {
            openai_api_key: env_string("OPENAI_API_KEY").unwrap_or_default(),
            firecrawl_api_key: env_string("FIRECRAWL_API_KEY").unwrap_or_default(),
            llm_model: env_string("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_temperature: env_parse("LLM_TEMPERATURE", defaults.llm_temperature),
            analysis_temperature: env_parse("ANALYSIS_TEMPERATURE", defaults.analysis_temperature),
            max_tokens: env_parse("MAX_TOKENS", defaults.max_tokens),
            llm_timeout_secs: env_parse("LLM_TIMEOUT", defaults.llm_timeout_secs),
            max_search_results: env_parse("MAX_SEARCH_RESULTS", defaults.max_search_results),
            max_scraping_concurrent: concurrency.max(1),
            scraping_timeout_secs: env_parse("SCRAPING_TIMEOUT", defaults.scraping_timeout_secs),
            include_domains,
            log_level: log_level_from_env(),
            openai_base_url: env_string("OPENAI_BASE_URL"),
            firecrawl_base_url: env_string("FIRECRAWL_BASE_URL")
                .unwrap_or(defaults.firecrawl_base_url),
        }
    }

    /// Names of required credentials that are absent or blank.
    pub fn missing_keys(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.openai_api_key.trim().is_empty() {
            missing.push("OPENAI_API_KEY".to_string());
        }
        if self.firecrawl_api_key.trim().is_empty() {
            missing.push("FIRECRAWL_API_KEY".to_string());
        }
        missing
    }

    /// Fail with a configuration error naming every missing key.
    pub fn validate(&self) -> ResearchResult<()> {
        let missing = self.missing_keys();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ResearchError::Configuration { missing })
        }
    }

    /// Per-scrape timeout.
    #[must_use]
    pub fn scraping_timeout(&self) -> Duration {
        Duration::from_secs(self.scraping_timeout_secs)
    }

    /// Per-request LLM timeout.
    #[must_use]
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

/// Lowercased `LOG_LEVEL`, or the default level.
///
/// Readable before `ResearchConfig::load`, whose warnings need a subscriber.
pub fn log_level_from_env() -> String {
    env_string("LOG_LEVEL")
        .map_or_else(|| DEFAULT_LOG_LEVEL.to_string(), |l| l.to_lowercase())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env_string(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
        None => default,
    }
}

fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}
