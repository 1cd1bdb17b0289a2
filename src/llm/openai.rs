use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::provider::{check_status, ChatStream, LlmProvider};
use super::sse::SseLineBuffer;
use super::types::ChatRequest;
use crate::core::errors::ApiError;

const PROVIDER_NAME: &str = "openai";

/// OpenAI chat-completions client.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    client: Client,
    request_timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, api_key: impl Into<String>, client: Client, request_timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
            request_timeout,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

fn build_body(request: &ChatRequest, model_id: &str, stream: bool) -> Value {
    let mut body = json!({
        "model": model_id,
        "messages": request.messages,
        "stream": stream,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(t) = request.temperature {
            obj.insert("temperature".to_string(), json!(t));
        }
        if let Some(t) = request.max_tokens {
            obj.insert("max_tokens".to_string(), json!(t));
        }
    }

    body
}

/// Text carried by one streamed chunk, if any.
fn delta_content(payload: &Value) -> Option<&str> {
    payload["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|content| !content.is_empty())
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        let body = build_body(&request, model_id, false);

        let res = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;
        let res = check_status(PROVIDER_NAME, res).await?;

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }

    async fn stream_chat(&self, request: ChatRequest, model_id: &str) -> Result<ChatStream, ApiError> {
        let body = build_body(&request, model_id, true);

        let res = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;
        let res = check_status(PROVIDER_NAME, res).await?;

        let (tx, rx) = mpsc::channel(32);
        let mut stream = res.bytes_stream();

        tokio::spawn(async move {
            let mut lines = SseLineBuffer::default();
            while let Some(item) = stream.next().await {
                match item {
                    Ok(bytes) => {
                        for data in lines.push(&bytes) {
                            if data == "[DONE]" {
                                return;
                            }
                            let Ok(payload) = serde_json::from_str::<Value>(&data) else {
                                tracing::debug!("Skipping unparsable OpenAI chunk: {}", data);
                                continue;
                            };
                            if let Some(content) = delta_content(&payload) {
                                if tx.send(Ok(content.to_string())).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(ApiError::upstream(e))).await;
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}
