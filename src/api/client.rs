use crate::api::models::{ChatRequest, EvidenceResponse, ReplyMessage};
use crate::api::response::{api_error, extract_message};
use crate::config::Config;
use crate::error::{Result, RunixError};
use async_trait::async_trait;
use bytes::Bytes;
use colored::*;
use futures::stream::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::pin::Pin;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// What `/api/chat` answered with.
pub enum ChatReply {
    Message(ReplyMessage),
    Stream(ByteStream),
}

/// The HTTP surface the chat client talks to.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply>;

    async fn fetch_evidence(&self, task_id: &str) -> Result<Vec<Value>>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    chat_endpoint: String,
    evidence_endpoint: String,
    verbose: bool,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                    RunixError::ConfigError(format!("Invalid authorization header: {}", e))
                })?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            chat_endpoint: config.chat_endpoint(),
            evidence_endpoint: config.evidence_endpoint(),
            verbose: config.verbose,
        })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        if self.verbose {
            eprintln!(
                "{}",
                format!(
                    "[runix] POST {} (agent={}, stream={}, messages={})",
                    self.chat_endpoint,
                    request.agent,
                    request.stream,
                    request.messages.len()
                )
                .dimmed()
            );
        }

        let response = self
            .client
            .post(&self.chat_endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if self.verbose {
            eprintln!("{}", format!("[runix] Response status: {}", status).dimmed());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("text/event-stream"))
            .unwrap_or(false);

        if is_event_stream {
            let bytes = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(RunixError::from));
            return Ok(ChatReply::Stream(Box::pin(bytes)));
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body)?;
        Ok(ChatReply::Message(extract_message(&json)?))
    }

    async fn fetch_evidence(&self, task_id: &str) -> Result<Vec<Value>> {
        if self.verbose {
            eprintln!(
                "{}",
                format!("[runix] Fetching evidence for task {}", task_id).dimmed()
            );
        }

        let response = self
            .client
            .get(&self.evidence_endpoint)
            .query(&[("task_id", task_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let parsed: EvidenceResponse = response.json().await?;
        Ok(parsed.evidence)
    }
}
