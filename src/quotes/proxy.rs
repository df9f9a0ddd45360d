// src/quotes/proxy.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;

use super::{parse_chart_body, QuoteError, QuoteSource, RawQuote};

/// Calls `GET {base}/quote?symbol=<ticker>` on the same-origin quote proxy.
#[derive(Clone)]
pub struct ProxyQuoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProxyQuoteClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("market-tracker/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("building quote proxy http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl QuoteSource for ProxyQuoteClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, QuoteError> {
        counter!("quotes_fetch_total").increment(1);

        let resp = self
            .http
            .get(format!("{}/quote", self.base_url))
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| QuoteError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(QuoteError::HttpStatus(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| QuoteError::Transport(e.to_string()))?;
        parse_chart_body(&body)
    }

    fn name(&self) -> &'static str {
        "quote-proxy"
    }
}
