// src/news/mod.rs
//! News retrieval for a selected asset.
//!
//! The search backend returns free text that is supposed to contain a JSON
//! array of articles. The text is untrusted: the first `[...]` span is
//! extracted, strictly validated, and anything that does not match falls back
//! to templated articles. This module never surfaces an error to callers.

pub mod claude;
pub mod newsdata;

use std::sync::Arc;

use async_trait::async_trait;
use metrics::{counter, describe_counter};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::NewsArticle;

pub use claude::ClaudeSearchBackend;

pub const DEFAULT_ARTICLE_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NewsError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("search backend responded with {0}")]
    HttpStatus(u16),
    #[error("no JSON array found in response")]
    NoArrayFound,
    #[error("article list failed validation: {0}")]
    ParseFailure(String),
    #[error("{0}")]
    Config(String),
}

impl NewsError {
    /// Which templated fallback this error maps to.
    pub fn fallback_tier(&self) -> FallbackTier {
        match self {
            NewsError::NoArrayFound | NewsError::ParseFailure(_) => FallbackTier::Unparsed,
            NewsError::Transport(_) | NewsError::HttpStatus(_) | NewsError::Config(_) => {
                FallbackTier::Unreachable
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    /// Backend answered but no valid article array could be extracted.
    Unparsed,
    /// Backend could not be reached or returned a non-success status.
    Unreachable,
}

impl FallbackTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackTier::Unparsed => "unparsed",
            FallbackTier::Unreachable => "unreachable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "tier")]
pub enum ArticleOrigin {
    Search,
    Fallback(FallbackTier),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsOutcome {
    pub articles: Vec<NewsArticle>,
    pub origin: ArticleOrigin,
}

/// Natural-language search backend. Returns the concatenated text blocks.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, prompt: &str) -> Result<String, NewsError>;
    fn name(&self) -> &'static str;
}

pub type DynSearchBackend = Arc<dyn SearchBackend>;

/// Backend with a canned reply. Used in tests and when no API key is configured.
#[derive(Debug, Clone)]
pub struct StaticSearchBackend {
    reply: Result<String, NewsError>,
}

impl StaticSearchBackend {
    pub fn text(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
        }
    }

    pub fn failing(err: NewsError) -> Self {
        Self { reply: Err(err) }
    }

    pub fn unconfigured() -> Self {
        Self::failing(NewsError::Config("news search backend not configured".into()))
    }
}

#[async_trait]
impl SearchBackend for StaticSearchBackend {
    async fn search(&self, _prompt: &str) -> Result<String, NewsError> {
        self.reply.clone()
    }
    fn name(&self) -> &'static str {
        "static"
    }
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_requests_total", "News lookups for a selected asset.");
        describe_counter!(
            "news_fallback_total",
            "News lookups answered with templated articles, by tier."
        );
    });
}

/// Strip common corporate suffixes to improve search relevance.
pub fn build_search_query(name: &str) -> String {
    name.replacen(" Inc.", "", 1)
        .replacen(" Corp.", "", 1)
        .trim()
        .to_string()
}

pub fn build_prompt(query: &str, symbol: &str, count: usize) -> String {
    format!(
        "Search for the latest {count} news articles about {query} ({symbol}). \
Return ONLY a JSON array with this structure, no other text:\n\
[{{\"title\": \"headline\", \"source\": \"source name\", \"time\": \"time ago\", \"summary\": \"brief summary\"}}]"
    )
}

static ARRAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("article array regex"));

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: String,
    source: String,
    time: String,
    summary: String,
}

/// Extract and validate the article array embedded in free text.
///
/// The match is greedy: it spans from the first `[` to the last `]`.
pub fn extract_articles(text: &str) -> Result<Vec<NewsArticle>, NewsError> {
    let span = ARRAY_RE
        .find(text)
        .ok_or(NewsError::NoArrayFound)?
        .as_str();

    let raw: Vec<RawArticle> =
        serde_json::from_str(span).map_err(|e| NewsError::ParseFailure(e.to_string()))?;
    if raw.is_empty() {
        return Err(NewsError::ParseFailure("empty article list".into()));
    }

    raw.into_iter()
        .enumerate()
        .map(|(i, a)| {
            let title = a.title.trim().to_string();
            if title.is_empty() {
                return Err(NewsError::ParseFailure(format!("article {i} has no title")));
            }
            Ok(NewsArticle {
                title,
                source: a.source.trim().to_string(),
                time: a.time.trim().to_string(),
                summary: a.summary.trim().to_string(),
                url: None,
            })
        })
        .collect()
}

/// Fixed three-article list referencing the asset name.
pub fn fallback_articles(name: &str, tier: FallbackTier) -> Vec<NewsArticle> {
    let rows: [(String, &str, &str, &str); 3] = match tier {
        FallbackTier::Unparsed => [
            (
                format!("{name} announces Q4 earnings beat expectations"),
                "Financial Times",
                "2 hours ago",
                "Strong quarterly results drive investor confidence",
            ),
            (
                format!("Analysts upgrade {name} stock rating"),
                "Bloomberg",
                "5 hours ago",
                "Major financial institutions increase price targets",
            ),
            (
                format!("{name} expands market presence in Asia"),
                "Reuters",
                "1 day ago",
                "Strategic partnerships announced in key markets",
            ),
        ],
        FallbackTier::Unreachable => [
            (
                format!("{name} reports strong market performance"),
                "Financial Times",
                "2 hours ago",
                "Market analysts remain optimistic about growth prospects",
            ),
            (
                format!("{name} price analysis and forecast"),
                "Bloomberg",
                "5 hours ago",
                "Technical indicators suggest continued momentum",
            ),
            (
                format!("What investors need to know about {name}"),
                "Reuters",
                "1 day ago",
                "Key factors driving recent price movements",
            ),
        ],
    };
    rows.into_iter()
        .map(|(title, source, time, summary)| NewsArticle::new(title, source, time, summary))
        .collect()
}

pub struct NewsRetriever {
    backend: DynSearchBackend,
    article_count: usize,
}

impl NewsRetriever {
    pub fn new(backend: DynSearchBackend, article_count: usize) -> Self {
        Self {
            backend,
            article_count: article_count.max(1),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Look up news for an asset. Any failure is absorbed into templated articles.
    pub async fn fetch_news(&self, symbol: &str, name: &str) -> NewsOutcome {
        ensure_metrics_described();
        counter!("news_requests_total").increment(1);

        let query = build_search_query(name);
        let prompt = build_prompt(&query, symbol, self.article_count);

        let result = match self.backend.search(&prompt).await {
            Ok(text) => extract_articles(&text),
            Err(e) => Err(e),
        };

        match result {
            Ok(mut articles) => {
                articles.truncate(self.article_count);
                tracing::debug!(
                    target: "news",
                    %symbol,
                    count = articles.len(),
                    backend = self.backend.name(),
                    "news parsed"
                );
                NewsOutcome {
                    articles,
                    origin: ArticleOrigin::Search,
                }
            }
            Err(e) => {
                let tier = e.fallback_tier();
                tracing::warn!(
                    target: "news",
                    %symbol,
                    error = %e,
                    tier = tier.as_str(),
                    "news lookup fell back to templated articles"
                );
                counter!("news_fallback_total", "tier" => tier.as_str()).increment(1);
                NewsOutcome {
                    articles: fallback_articles(name, tier),
                    origin: ArticleOrigin::Fallback(tier),
                }
            }
        }
    }
}
