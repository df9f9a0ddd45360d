// src/quotes/mod.rs
//! Quote client: one request per symbol against the same-origin quote proxy,
//! plus the chart-envelope parser that turns a body into a `RawQuote`.

pub mod proxy;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub use proxy::ProxyQuoteClient;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuoteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),
    #[error("invalid data structure: {0}")]
    InvalidShape(String),
    #[error("missing price data")]
    MissingPriceData,
}

impl QuoteError {
    /// Short label used as a metrics dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            QuoteError::Transport(_) => "transport",
            QuoteError::HttpStatus(_) => "http",
            QuoteError::InvalidShape(_) => "invalid_shape",
            QuoteError::MissingPriceData => "missing_price",
        }
    }
}

/// Point-in-time snapshot with change figures derived from the previous close.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuote {
    pub price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: Option<u64>,
    pub market_cap: Option<u64>,
    pub currency: String,
}

impl RawQuote {
    pub fn from_prices(
        price: f64,
        previous_close: f64,
        volume: Option<u64>,
        market_cap: Option<u64>,
        currency: Option<String>,
    ) -> Self {
        let change = price - previous_close;
        let change_percent = change / previous_close * 100.0;
        Self {
            price,
            previous_close,
            change,
            change_percent,
            volume,
            market_cap,
            currency: currency.unwrap_or_else(|| "USD".to_string()),
        }
    }
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, QuoteError>;
    fn name(&self) -> &'static str;
}

// Only the envelope is typed; `meta` stays loose so absent vs non-numeric
// fields map to `MissingPriceData` rather than a deserialization error.
#[derive(Debug, Deserialize)]
struct Envelope {
    chart: Option<Chart>,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<serde_json::Map<String, Value>>,
}

/// Parse a chart body `{chart:{result:[{meta:{..}}]}}` into a quote.
pub fn parse_chart_body(body: &str) -> Result<RawQuote, QuoteError> {
    let env: Envelope = serde_json::from_str(body)
        .map_err(|e| QuoteError::InvalidShape(format!("body is not a chart envelope: {e}")))?;

    let result = env
        .chart
        .and_then(|c| c.result)
        .ok_or_else(|| QuoteError::InvalidShape("missing chart.result".into()))?;
    let first = result
        .into_iter()
        .next()
        .ok_or_else(|| QuoteError::InvalidShape("empty chart.result".into()))?;
    let meta = first
        .meta
        .ok_or_else(|| QuoteError::InvalidShape("missing meta".into()))?;

    let price = positive_number(meta.get("regularMarketPrice"))
        .ok_or(QuoteError::MissingPriceData)?;
    let previous_close = positive_number(meta.get("chartPreviousClose"))
        .ok_or(QuoteError::MissingPriceData)?;

    let volume = meta.get("regularMarketVolume").and_then(as_count);
    let market_cap = meta.get("marketCap").and_then(as_count);
    let currency = meta
        .get("currency")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(RawQuote::from_prices(
        price,
        previous_close,
        volume,
        market_cap,
        currency,
    ))
}

// Zero and negative values are treated as absent: a zero previous close has
// no defined percentage.
fn positive_number(v: Option<&Value>) -> Option<f64> {
    v.and_then(Value::as_f64).filter(|x| x.is_finite() && *x > 0.0)
}

fn as_count(v: &Value) -> Option<u64> {
    v.as_u64()
        .or_else(|| v.as_f64().filter(|x| *x >= 0.0).map(|x| x as u64))
}
