// src/config/tracker.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

use crate::news::{claude, newsdata, DEFAULT_ARTICLE_COUNT};
use crate::types::{AssetType, WatchlistEntry};
use crate::upstream::DEFAULT_UPSTREAM;
use crate::watchlist::default_entries;

pub const DEFAULT_TRACKER_CONFIG_PATH: &str = "config/tracker.toml";
pub const ENV_TRACKER_CONFIG_PATH: &str = "TRACKER_CONFIG_PATH";
pub const ENV_REFRESH_INTERVAL_SECS: &str = "REFRESH_INTERVAL_SECS";
pub const ENV_QUOTE_PROXY_BASE_URL: &str = "QUOTE_PROXY_BASE_URL";
pub const ENV_SEARCH_API_KEY: &str = "ANTHROPIC_API_KEY";

pub const DEFAULT_REFRESH_SECS: u64 = 60;
const MIN_REFRESH_SECS: u64 = 5;
const MAX_ARTICLE_COUNT: usize = 10;

fn default_interval_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}
fn default_proxy_base() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_upstream() -> String {
    DEFAULT_UPSTREAM.to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_true() -> bool {
    true
}
fn default_model() -> String {
    claude::DEFAULT_MODEL.to_string()
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_article_count() -> usize {
    DEFAULT_ARTICLE_COUNT
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_search_endpoint() -> String {
    claude::DEFAULT_ENDPOINT.to_string()
}
fn default_newsdata_endpoint() -> String {
    newsdata::DEFAULT_ENDPOINT.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSection {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotesSection {
    /// Where the quote client sends `GET /quote?symbol=`.
    #[serde(default = "default_proxy_base")]
    pub proxy_base_url: String,
    /// Chart provider behind the proxy route.
    #[serde(default = "default_upstream")]
    pub upstream_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for QuotesSection {
    fn default() -> Self {
        Self {
            proxy_base_url: default_proxy_base(),
            upstream_base_url: default_upstream(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_article_count")]
    pub article_count: usize,
    /// "ENV" means: read from ANTHROPIC_API_KEY.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
}

impl Default for NewsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_model(),
            max_tokens: default_max_tokens(),
            article_count: default_article_count(),
            api_key: default_api_key(),
            endpoint: default_search_endpoint(),
        }
    }
}

impl NewsSection {
    /// Resolve the backend key; `None` when unset or empty.
    pub fn resolved_api_key(&self) -> Option<String> {
        let raw = self.api_key.trim();
        let key = if raw.eq_ignore_ascii_case("env") {
            env::var(ENV_SEARCH_API_KEY).ok()?
        } else {
            raw.to_string()
        };
        let key = key.trim().to_string();
        (!key.is_empty()).then_some(key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsDataSection {
    #[serde(default = "default_newsdata_endpoint")]
    pub endpoint: String,
}

impl Default for NewsDataSection {
    fn default() -> Self {
        Self {
            endpoint: default_newsdata_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedEntry {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: AssetType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub refresh: RefreshSection,
    #[serde(default)]
    pub quotes: QuotesSection,
    #[serde(default)]
    pub news: NewsSection,
    #[serde(default)]
    pub newsdata: NewsDataSection,
    #[serde(default)]
    pub watchlist: Vec<SeedEntry>,
}

impl TrackerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: TrackerConfig = toml::from_str(s).context("parsing tracker config")?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading tracker config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $TRACKER_CONFIG_PATH (must exist)
    /// 2) config/tracker.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_TRACKER_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_TRACKER_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let pb = PathBuf::from(DEFAULT_TRACKER_CONFIG_PATH);
            if pb.exists() {
                Self::load_from_file(&pb)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(secs) = env::var(ENV_REFRESH_INTERVAL_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.refresh.interval_secs = secs;
        }
        if let Ok(url) = env::var(ENV_QUOTE_PROXY_BASE_URL) {
            if !url.trim().is_empty() {
                self.quotes.proxy_base_url = url.trim().to_string();
            }
        }
    }

    fn sanitize(&mut self) {
        self.refresh.interval_secs = self.refresh.interval_secs.max(MIN_REFRESH_SECS);
        self.news.article_count = self.news.article_count.clamp(1, MAX_ARTICLE_COUNT);
        self.quotes.timeout_secs = self.quotes.timeout_secs.max(1);
    }

    /// Seed list for the watchlist store; defaults when none configured.
    pub fn seed_entries(&self) -> Vec<WatchlistEntry> {
        if self.watchlist.is_empty() {
            return default_entries();
        }
        self.watchlist
            .iter()
            .map(|s| WatchlistEntry::new(s.symbol.clone(), s.name.clone(), s.kind))
            .collect()
    }
}
