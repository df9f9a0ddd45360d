// src/news/newsdata.rs
//! Dated-article provider behind `GET /news?query=`.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::types::NewsArticle;

pub const DEFAULT_ENDPOINT: &str = "https://newsdata.io/api/1/news";
pub const ENV_API_KEY: &str = "NEWSDATA_API_KEY";
pub const SUMMARY_MAX_CHARS: usize = 120;
pub const SUMMARY_PLACEHOLDER: &str = "Click to read full article.";

#[derive(Debug, Deserialize)]
struct Resp {
    status: Option<String>,
    #[serde(default)]
    results: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    source_id: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    link: Option<String>,
}

#[derive(Clone)]
pub struct NewsDataClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl NewsDataClient {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("building news provider http client")?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Reads the API key from `NEWSDATA_API_KEY`.
    pub fn from_env(endpoint: &str) -> Result<Self> {
        Self::new(endpoint, std::env::var(ENV_API_KEY).ok())
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn search(&self, query: &str) -> Result<Vec<NewsArticle>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("{ENV_API_KEY} not configured"))?;

        let resp = self
            .http
            .get(&self.endpoint)
            .header("Accept", "application/json")
            .query(&[
                ("apikey", key),
                ("q", query),
                ("language", "en"),
                ("category", "business,technology"),
                ("size", "5"),
            ])
            .send()
            .await
            .context("news provider request")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("NewsData API responded with {}", status.as_u16());
        }
        let body: Resp = resp.json().await.context("news provider body")?;
        map_response(body, Utc::now())
    }
}

fn map_response(body: Resp, now: DateTime<Utc>) -> Result<Vec<NewsArticle>> {
    if body.status.as_deref() != Some("success") || body.results.is_empty() {
        bail!("No articles found");
    }
    Ok(body
        .results
        .into_iter()
        .map(|it| NewsArticle {
            title: it.title.unwrap_or_default(),
            source: it
                .source_id
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "News".to_string()),
            time: format_time_ago(it.pub_date.as_deref(), now),
            summary: summarize(it.description.as_deref()),
            url: it.link,
        })
        .collect())
}

/// Map a raw provider body (JSON text) to articles, relative to `now`.
pub fn map_body(body: &str, now: DateTime<Utc>) -> Result<Vec<NewsArticle>> {
    let parsed: Resp = serde_json::from_str(body).context("parsing news provider body")?;
    map_response(parsed, now)
}

fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|n| n.and_utc())
        })
}

/// "Xm ago" under an hour, "Xh ago" under a day, otherwise "Xd ago".
pub fn format_time_ago(pub_date: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(published) = pub_date.and_then(parse_pub_date) else {
        return "Recently".to_string();
    };
    let mins = (now - published).num_minutes().max(0);
    let hours = mins / 60;
    let days = hours / 24;
    if mins < 60 {
        format!("{mins}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else {
        format!("{days}d ago")
    }
}

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Decoded, whitespace-collapsed description capped at 120 chars.
pub fn summarize(description: Option<&str>) -> String {
    let decoded = description
        .map(|d| html_escape::decode_html_entities(d).to_string())
        .unwrap_or_default();
    let text = RE_WS.replace_all(decoded.trim(), " ").to_string();
    if text.is_empty() {
        return SUMMARY_PLACEHOLDER.to_string();
    }
    if text.chars().count() > SUMMARY_MAX_CHARS {
        let cut: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{}...", cut.trim_end())
    } else {
        text
    }
}
