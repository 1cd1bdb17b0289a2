use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::mpsc;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// Chunks of answer text, in order. An `Err` item ends the stream.
pub type ChatStream = mpsc::Receiver<Result<String, ApiError>>;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "openai", "anthropic")
    fn name(&self) -> &str;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError>;

    /// chat completion (streaming)
    async fn stream_chat(&self, request: ChatRequest, model_id: &str) -> Result<ChatStream, ApiError>;
}

/// Maps a non-success upstream response onto the error taxonomy.
pub(crate) async fn check_status(
    provider: &str,
    res: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let detail = format!("{} returned {}: {}", provider, status, truncate(&body, 500));
    if status == StatusCode::TOO_MANY_REQUESTS {
        Err(ApiError::UpstreamRateLimited(detail))
    } else {
        Err(ApiError::UpstreamUnavailable(detail))
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("short", 10), "short");
    }
}
