// src/news/claude.rs
//! Messages API backend with the server-side web search tool enabled.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{NewsError, SearchBackend};

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";

pub struct ClaudeSearchBackend {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeSearchBackend {
    pub fn new(endpoint: &str, api_key: String, model: &str, max_tokens: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            // web search round-trips are slow
            .timeout(Duration::from_secs(60))
            .build()
            .context("building search backend http client")?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key,
            model: model.to_string(),
            max_tokens,
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Tool<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Msg<'a>>,
    tools: Vec<Tool<'a>>,
}

#[derive(Deserialize)]
struct Resp {
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Concatenate the `text` blocks of a Messages API response body; tool-use
/// and search-result blocks are skipped. A body without a `content` list is
/// treated like a failed call, not like unparseable article text.
pub fn concat_text_blocks(body: &str) -> Result<String, NewsError> {
    let resp: Resp = serde_json::from_str(body)
        .map_err(|e| NewsError::Transport(format!("malformed response body: {e}")))?;
    Ok(resp
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .collect::<Vec<_>>()
        .join(""))
}

#[async_trait]
impl SearchBackend for ClaudeSearchBackend {
    async fn search(&self, prompt: &str) -> Result<String, NewsError> {
        let req = Req {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            tools: vec![Tool {
                kind: "web_search_20250305",
                name: "web_search",
            }],
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&req)
            .send()
            .await
            .map_err(|e| NewsError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NewsError::HttpStatus(status.as_u16()));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| NewsError::Transport(e.to_string()))?;
        concat_text_blocks(&body)
    }

    fn name(&self) -> &'static str {
        "claude"
    }
}
