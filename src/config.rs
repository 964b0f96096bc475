//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file with environment variable overrides
//! for sensitive values like `GITHUB_TOKEN`.

use serde::Deserialize;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Result};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub limiter: LimiterConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub freshness: FreshnessConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream market API endpoints and HTTP behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub base_url: String,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_upstream_url() -> String {
    "https://esi.evetech.net/latest".into()
}

/// HTTP client tuning shared by both outbound clients.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

const fn default_timeout_ms() -> u64 {
    30_000
}

const fn default_connect_timeout_ms() -> u64 {
    10_000
}

/// Outbound rate limiter: at most `max_in_window` calls per sliding `window_ms`.
#[derive(Debug, Clone, Deserialize)]
pub struct LimiterConfig {
    #[serde(default = "default_max_in_window")]
    pub max_in_window: usize,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

const fn default_max_in_window() -> usize {
    20
}

const fn default_window_ms() -> u64 {
    1_000
}

/// Paged region scan tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Concurrent page workers per region.
    #[serde(default = "default_page_concurrency")]
    pub page_concurrency: usize,
    /// Fixed delay between consecutive fetches by the same worker.
    #[serde(default = "default_page_pacing_ms")]
    pub page_pacing_ms: u64,
    /// Attempts per page before giving up on it.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Base backoff, doubled on each retry.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

const fn default_page_concurrency() -> usize {
    2
}

const fn default_page_pacing_ms() -> u64 {
    100
}

const fn default_retry_max_attempts() -> u32 {
    3
}

const fn default_retry_backoff_ms() -> u64 {
    500
}

/// How old a published snapshot may be before it is regenerated.
#[derive(Debug, Clone, Deserialize)]
pub struct FreshnessConfig {
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: i64,
}

const fn default_max_age_minutes() -> i64 {
    10
}

/// Region scheduling: a small latency-sensitive hub set, then everything else.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_hub_regions")]
    pub hub_regions: Vec<u32>,
    #[serde(default = "default_hub_concurrency")]
    pub hub_concurrency: usize,
    #[serde(default = "default_bulk_concurrency")]
    pub bulk_concurrency: usize,
    /// When set, the bulk pass squashes all publishes into one commit per target.
    #[serde(default)]
    pub bulk_mode: bool,
}

fn default_hub_regions() -> Vec<u32> {
    // The Forge, Domain, Sinq Laison, Heimatar, Metropolis
    vec![10000002, 10000043, 10000032, 10000030, 10000042]
}

const fn default_hub_concurrency() -> usize {
    2
}

const fn default_bulk_concurrency() -> usize {
    6
}

/// Content store endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_api_url")]
    pub api_url: String,
    /// Public unauthenticated read path, used by the freshness gate.
    #[serde(default = "default_store_raw_url")]
    pub raw_url: String,
    #[serde(default)]
    pub http: HttpConfig,
    /// Loaded from `GITHUB_TOKEN` env var at runtime (never from config file).
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_store_api_url() -> String {
    "https://api.github.com".into()
}

fn default_store_raw_url() -> String {
    "https://raw.githubusercontent.com".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// One branch of one repository that snapshots are mirrored to.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    #[serde(default = "default_data_prefix")]
    pub data_prefix: String,
}

fn default_data_prefix() -> String {
    "data".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;

        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;

        // Token only ever comes from the environment.
        config.store.token = std::env::var("GITHUB_TOKEN").ok();

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.upstream.base_url.is_empty() {
            return Err(ConfigError::MissingField { field: "base_url" }.into());
        }
        if self.limiter.max_in_window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_in_window",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.scan.page_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_concurrency",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.freshness.max_age_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_age_minutes",
                reason: "must be positive".into(),
            }
            .into());
        }
        for target in &self.publish.targets {
            if target.owner.is_empty() {
                return Err(ConfigError::MissingField { field: "owner" }.into());
            }
            if target.repo.is_empty() {
                return Err(ConfigError::MissingField { field: "repo" }.into());
            }
            if target.branch.is_empty() {
                return Err(ConfigError::MissingField { field: "branch" }.into());
            }
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            limiter: LimiterConfig::default(),
            scan: ScanConfig::default(),
            freshness: FreshnessConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            store: StoreConfig::default(),
            publish: PublishConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_url(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_in_window: default_max_in_window(),
            window_ms: default_window_ms(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            page_concurrency: default_page_concurrency(),
            page_pacing_ms: default_page_pacing_ms(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            max_age_minutes: default_max_age_minutes(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            hub_regions: default_hub_regions(),
            hub_concurrency: default_hub_concurrency(),
            bulk_concurrency: default_bulk_concurrency(),
            bulk_mode: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_url: default_store_api_url(),
            raw_url: default_store_raw_url(),
            http: HttpConfig::default(),
            token: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
