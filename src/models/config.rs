//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Per-source endpoints
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Local SQLite store
    #[serde(default)]
    pub storage: StorageConfig,

    /// Remote (PostgREST) store
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Blank values are ignored. Numeric values that fail to parse are logged
    /// and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("INFOPARK_URL") {
            self.sources.infopark.listing_url = v;
        }
        if let Some(v) = get("TECHNOPARK_URL") {
            self.sources.technopark.listing_url = v;
        }
        if let Some(v) = get("ULCYBERPARK_URL") {
            self.sources.ulcyberpark.listing_url = v;
        }
        if let Some(v) = get("CYBERPARK_FEED_URL") {
            self.sources.cyberpark_feed.feed_url = v;
        }
        if let Some(v) = get("SUPABASE_URL") {
            self.remote.url = Some(v);
        }
        if let Some(v) = get("SUPABASE_KEY") {
            self.remote.key = Some(v);
        }
        if let Some(v) = get("SUPABASE_TABLE") {
            self.remote.table = v;
        }
        if let Some(v) = get("JOBS_DB_PATH") {
            self.storage.database_path = PathBuf::from(v);
        }
        if let Some(v) = get("CRAWLER_MAX_CONCURRENT") {
            match v.trim().parse() {
                Ok(n) => self.crawler.max_concurrent = n,
                Err(e) => log::warn!("Ignoring CRAWLER_MAX_CONCURRENT={v}: {e}"),
            }
        }
        if let Some(v) = get("CRAWLER_TIMEOUT_SECS") {
            match v.trim().parse() {
                Ok(n) => self.crawler.timeout_secs = n,
                Err(e) => log::warn!("Ignoring CRAWLER_TIMEOUT_SECS={v}: {e}"),
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.max_pages == 0 {
            return Err(AppError::validation("crawler.max_pages must be > 0"));
        }

        let urls = [
            ("sources.infopark.listing_url", &self.sources.infopark.listing_url),
            ("sources.infopark.profile_url", &self.sources.infopark.profile_url),
            ("sources.technopark.listing_url", &self.sources.technopark.listing_url),
            ("sources.technopark.detail_url", &self.sources.technopark.detail_url),
            ("sources.ulcyberpark.listing_url", &self.sources.ulcyberpark.listing_url),
            ("sources.cyberpark_feed.feed_url", &self.sources.cyberpark_feed.feed_url),
        ];
        for (name, value) in urls {
            let parsed = url::Url::parse(value)
                .map_err(|e| AppError::validation(format!("{name} is not a URL: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::validation(format!("{name} must be http(s)")));
            }
        }

        if self.remote.table.trim().is_empty() {
            return Err(AppError::validation("remote.table is empty"));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum in-flight detail fetches across all sources
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Upper bound on listing pages per source
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            max_pages: defaults::max_pages(),
        }
    }
}

/// Endpoints for every supported portal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub infopark: InfoparkConfig,

    #[serde(default)]
    pub technopark: TechnoparkConfig,

    #[serde(default)]
    pub ulcyberpark: UlCyberparkConfig,

    #[serde(default)]
    pub cyberpark_feed: CyberparkFeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoparkConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Job search page, paginated with `?page=N`
    #[serde(default = "defaults::infopark_listing")]
    pub listing_url: String,

    /// Company profile base; the job link's last path segment is appended
    #[serde(default = "defaults::infopark_profile")]
    pub profile_url: String,
}

impl Default for InfoparkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listing_url: defaults::infopark_listing(),
            profile_url: defaults::infopark_profile(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnoparkConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Paginated JSON API, paginated with `?page=N`
    #[serde(default = "defaults::technopark_listing")]
    pub listing_url: String,

    /// Detail page base; the job id is appended
    #[serde(default = "defaults::technopark_detail")]
    pub detail_url: String,
}

impl Default for TechnoparkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listing_url: defaults::technopark_listing(),
            detail_url: defaults::technopark_detail(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UlCyberparkConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// First listing page; later pages follow the next-page link
    #[serde(default = "defaults::ulcyberpark_listing")]
    pub listing_url: String,
}

impl Default for UlCyberparkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listing_url: defaults::ulcyberpark_listing(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CyberparkFeedConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// RSS job feed; a single document, no pagination
    #[serde(default = "defaults::cyberpark_feed")]
    pub feed_url: String,
}

impl Default for CyberparkFeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            feed_url: defaults::cyberpark_feed(),
        }
    }
}

/// Local store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::database_path")]
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: defaults::database_path(),
        }
    }
}

/// Remote store settings. Remote writes are skipped unless both `url` and
/// `key` are present; a partial setup is not a config error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default = "defaults::remote_table")]
    pub table: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            key: None,
            table: defaults::remote_table(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; parkjobs/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        10
    }
    pub fn max_pages() -> u32 {
        200
    }
    pub fn enabled() -> bool {
        true
    }

    pub fn infopark_listing() -> String {
        "https://infopark.in/companies/job-search".into()
    }
    pub fn infopark_profile() -> String {
        "https://infopark.in/companies/profile/".into()
    }
    pub fn technopark_listing() -> String {
        "https://technopark.org/api/paginated-jobs".into()
    }
    pub fn technopark_detail() -> String {
        "https://technopark.org/job-details/".into()
    }
    pub fn ulcyberpark_listing() -> String {
        "https://www.ulcyberpark.com/jobs/index".into()
    }
    pub fn cyberpark_feed() -> String {
        "https://www.cyberparkkerala.org/?feed=job_feed".into()
    }

    pub fn database_path() -> PathBuf {
        PathBuf::from("jobs.db")
    }
    pub fn remote_table() -> String {
        "jobs".into()
    }
}
