// src/upstream.rs
//! Upstream chart provider used by the `/quote` proxy route.

use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_UPSTREAM: &str = "https://query1.finance.yahoo.com";
const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Clone)]
pub struct YahooChartClient {
    http: reqwest::Client,
    base_url: String,
}

impl YahooChartClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(BROWSER_UA)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("building upstream chart http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the one-day chart for `symbol` and return the JSON body untouched.
    pub async fn chart(&self, symbol: &str) -> Result<serde_json::Value> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .query(&[("interval", "1d"), ("range", "1d")])
            .send()
            .await
            .with_context(|| format!("upstream request for {symbol}"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Yahoo Finance responded with {}", status.as_u16());
        }
        resp.json()
            .await
            .with_context(|| format!("upstream body for {symbol}"))
    }
}
