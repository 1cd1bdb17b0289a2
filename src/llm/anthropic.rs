use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::provider::{check_status, ChatStream, LlmProvider};
use super::sse::SseLineBuffer;
use super::types::{ChatMessage, ChatRequest, ChatRole};
use crate::core::errors::ApiError;

const PROVIDER_NAME: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";
const FALLBACK_MAX_TOKENS: u32 = 1024;

/// Anthropic Messages API client.
///
/// The Messages API takes the system prompt as a top-level field and
/// requires `max_tokens` on every call.
#[derive(Clone)]
pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    client: Client,
    request_timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(base_url: &str, api_key: impl Into<String>, client: Client, request_timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
            request_timeout,
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn post(&self, body: &Value) -> reqwest::RequestBuilder {
        self.client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
    }
}

fn build_body(request: &ChatRequest, model_id: &str, stream: bool) -> Value {
    let system: Vec<&str> = request
        .messages
        .iter()
        .filter(|m| m.role == ChatRole::System)
        .map(|m| m.content.as_str())
        .collect();
    let messages: Vec<&ChatMessage> = request
        .messages
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .collect();

    let mut body = json!({
        "model": model_id,
        "messages": messages,
        "max_tokens": request.max_tokens.unwrap_or(FALLBACK_MAX_TOKENS),
        "stream": stream,
    });

    if let Some(obj) = body.as_object_mut() {
        if !system.is_empty() {
            obj.insert("system".to_string(), json!(system.join("\n\n")));
        }
        if let Some(t) = request.temperature {
            obj.insert("temperature".to_string(), json!(t));
        }
    }

    body
}

/// What one streamed event means for the caller.
#[derive(Debug, PartialEq)]
enum StreamItem {
    Text(String),
    Stop,
    Error(ApiError),
    Skip,
}

fn parse_event(payload: &Value) -> StreamItem {
    match payload["type"].as_str() {
        Some("content_block_delta") => match payload["delta"]["text"].as_str() {
            Some(text) if !text.is_empty() => StreamItem::Text(text.to_string()),
            _ => StreamItem::Skip,
        },
        Some("message_stop") => StreamItem::Stop,
        Some("error") => {
            let kind = payload["error"]["type"].as_str().unwrap_or("unknown_error");
            let message = payload["error"]["message"].as_str().unwrap_or_default();
            let detail = format!("anthropic stream error {}: {}", kind, message);
            match kind {
                "overloaded_error" | "rate_limit_error" => {
                    StreamItem::Error(ApiError::UpstreamRateLimited(detail))
                }
                _ => StreamItem::Error(ApiError::UpstreamUnavailable(detail)),
            }
        }
        _ => StreamItem::Skip,
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        let body = build_body(&request, model_id, false);

        let res = self
            .post(&body)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(ApiError::upstream)?;
        let res = check_status(PROVIDER_NAME, res).await?;

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;

        let text = payload["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|block| block["text"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }

    async fn stream_chat(&self, request: ChatRequest, model_id: &str) -> Result<ChatStream, ApiError> {
        let body = build_body(&request, model_id, true);

        let res = self.post(&body).send().await.map_err(ApiError::upstream)?;
        let res = check_status(PROVIDER_NAME, res).await?;

        let (tx, rx) = mpsc::channel(32);
        let mut stream = res.bytes_stream();

        tokio::spawn(async move {
            let mut lines = SseLineBuffer::default();
            while let Some(item) = stream.next().await {
                let bytes = match item {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(Err(ApiError::upstream(e))).await;
                        return;
                    }
                };

                for data in lines.push(&bytes) {
                    let Ok(payload) = serde_json::from_str::<Value>(&data) else {
                        tracing::debug!("Skipping unparsable Anthropic event: {}", data);
                        continue;
                    };
                    match parse_event(&payload) {
                        StreamItem::Text(text) => {
                            if tx.send(Ok(text)).await.is_err() {
                                return;
                            }
                        }
                        StreamItem::Stop => return,
                        StreamItem::Error(err) => {
                            let _ = tx.send(Err(err)).await;
                            return;
                        }
                        StreamItem::Skip => {}
                    }
                }
            }
        });

        Ok(rx)
    }
}
