//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (NAI_SITE_*, `__` separates nested keys)
//! 2. TOML config file (if NAI_SITE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Literal page served when a shell request cannot reach the network.
pub const OFFLINE_PAGE: &str = "<!DOCTYPE html><title>Offline</title><h1>You are offline</h1>";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (NAI_SITE_*)
/// 2. TOML config file (if NAI_SITE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding cache generations.
    ///
    /// Set via NAI_SITE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via NAI_SITE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to read per network response.
    ///
    /// Set via NAI_SITE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via NAI_SITE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Static metadata injection settings.
    #[serde(default)]
    pub prerender: PrerenderConfig,

    /// Offline fetch policy settings.
    #[serde(default)]
    pub offline: OfflineConfig,
}

/// Settings for the post-build metadata injector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrerenderConfig {
    /// JSON array of content entries.
    #[serde(default = "default_content_path")]
    pub content_path: PathBuf,

    /// Bundler output directory; derived documents are written below it.
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,

    /// Base document file name inside `dist_dir`.
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// Route prefix for content pages, without surrounding slashes.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// Absolute site URL without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Breadcrumb label of the listing page at `route_prefix`.
    #[serde(default = "default_listing_name")]
    pub listing_name: String,

    /// Social share image used when an entry has none.
    #[serde(default = "default_image")]
    pub default_image: String,

    #[serde(default = "default_author")]
    pub default_author: String,

    #[serde(default = "default_section")]
    pub default_section: String,

    /// Publisher logo path, joined to `base_url`.
    #[serde(default = "default_publisher_logo")]
    pub publisher_logo: String,

    /// Fail the process on batch-level errors instead of only logging them.
    #[serde(default)]
    pub strict: bool,
}

/// Settings for the offline fetch policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    /// Origin the policy serves (scheme, host and port).
    #[serde(default = "default_base_url")]
    pub origin: String,

    /// Name of the current cache generation. Bump to invalidate old caches.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Same-origin paths stored on install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Body served when a shell request fails at the network layer.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./nai-site-cache.sqlite")
}

fn default_user_agent() -> String {
    "nai-site/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_content_path() -> PathBuf {
    PathBuf::from("src/data/newsArticles.json")
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_index_file() -> String {
    "index.html".into()
}

fn default_route_prefix() -> String {
    "blogs/news".into()
}

fn default_base_url() -> String {
    "https://nurseassistinternational.com".into()
}

fn default_site_name() -> String {
    "Nurse Assist International".into()
}

fn default_listing_name() -> String {
    "News".into()
}

fn default_image() -> String {
    "/og-image.png".into()
}

fn default_author() -> String {
    "NAI Editorial Team".into()
}

fn default_section() -> String {
    "Nursing Education".into()
}

fn default_publisher_logo() -> String {
    "/Images/NAI-LOGO.webp".into()
}

fn default_cache_version() -> String {
    "nai-cache-v2".into()
}

fn default_precache() -> Vec<String> {
    vec!["/manifest.json".into(), "/favicon.ico".into(), "/image.png".into()]
}

fn default_offline_page() -> String {
    OFFLINE_PAGE.into()
}

impl Default for PrerenderConfig {
    fn default() -> Self {
        Self {
            content_path: default_content_path(),
            dist_dir: default_dist_dir(),
            index_file: default_index_file(),
            route_prefix: default_route_prefix(),
            base_url: default_base_url(),
            site_name: default_site_name(),
            listing_name: default_listing_name(),
            default_image: default_image(),
            default_author: default_author(),
            default_section: default_section(),
            publisher_logo: default_publisher_logo(),
            strict: false,
        }
    }
}

impl PrerenderConfig {
    /// Path of the built base document.
    pub fn index_path(&self) -> PathBuf {
        self.dist_dir.join(&self.index_file)
    }

    /// Route prefix with surrounding slashes removed.
    pub fn route(&self) -> &str {
        self.route_prefix.trim_matches('/')
    }

    /// Directory that receives one `<slug>.html` per entry.
    pub fn output_dir(&self) -> PathBuf {
        let route = self.route();
        if route.is_empty() { self.dist_dir.clone() } else { self.dist_dir.join(route) }
    }

    /// Base URL with any trailing slash removed.
    pub fn site_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            origin: default_base_url(),
            cache_version: default_cache_version(),
            precache: default_precache(),
            offline_page: default_offline_page(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            prerender: PrerenderConfig::default(),
            offline: OfflineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `NAI_SITE_`
    /// 2. TOML file from `NAI_SITE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("NAI_SITE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("NAI_SITE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
