use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;
use uuid::Uuid;

use crate::context::{build_system_prompt, validate_history, RawHistoryEntry};
use crate::core::errors::ApiError;
use crate::llm::{ChatRequest, ChatStream};
use crate::state::AppState;
use crate::streaming::StreamEvent;

const DEFAULT_AGE: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default = "default_age")]
    pub age: i64,
    #[serde(default)]
    pub story_mode: bool,
    #[serde(default)]
    pub history: Vec<RawHistoryEntry>,
    /// `false` asks the provider for one complete answer instead of deltas.
    #[serde(default = "default_stream")]
    pub stream: bool,
}

fn default_age() -> i64 {
    DEFAULT_AGE
}

fn default_stream() -> bool {
    true
}

type EventStream = Sse<ReceiverStream<Result<Event, Infallible>>>;

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<EventStream, ApiError> {
    if req.question.trim().is_empty() {
        return Err(ApiError::Unprocessable("Question cannot be empty".to_string()));
    }
    let history = validate_history(req.history)?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "ask",
        %request_id,
        age = req.age,
        story_mode = req.story_mode
    );

    let system_prompt = build_system_prompt(req.age, req.story_mode);
    let assembled = state
        .assembler
        .assemble(&system_prompt, &history, &req.question);

    span.in_scope(|| {
        tracing::debug!(
            kept = assembled.history_len(),
            dropped = assembled.dropped_turns,
            history_tokens = assembled.history_tokens,
            history_budget = assembled.history_budget,
            "Assembled conversation"
        );
    });

    let reserve = state.assembler.budget().response_reserved_tokens();
    let chat_request = ChatRequest::new(assembled.into_messages())
        .with_max_tokens(u32::try_from(reserve).unwrap_or(u32::MAX));
    let model = state.settings.llm.model.as_str();

    let (tx, rx) = mpsc::channel(32);

    if req.stream {
        let chunks = state
            .llm
            .stream_chat(chat_request, model)
            .instrument(span.clone())
            .await?;
        tokio::spawn(forward_stream(chunks, tx).instrument(span));
    } else {
        let answer = state
            .llm
            .chat(chat_request, model)
            .instrument(span.clone())
            .await?;
        tokio::spawn(
            async move {
                let events = [
                    StreamEvent::thinking(),
                    StreamEvent::text(answer),
                    StreamEvent::done(),
                ];
                for event in events {
                    if tx.send(Ok(event.into())).await.is_err() {
                        return;
                    }
                }
            }
            .instrument(span),
        );
    }

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default()))
}

/// Relays provider deltas as `text` events, bracketed by `thinking` and `done`.
async fn forward_stream(mut chunks: ChatStream, tx: mpsc::Sender<Result<Event, Infallible>>) {
    if tx.send(Ok(StreamEvent::thinking().into())).await.is_err() {
        return;
    }

    let mut count = 0usize;
    let mut done = StreamEvent::done();
    while let Some(chunk) = chunks.recv().await {
        match chunk {
            Ok(text) => {
                count += 1;
                if tx.send(Ok(StreamEvent::text(text).into())).await.is_err() {
                    tracing::debug!("Client disconnected after {} chunks", count);
                    return;
                }
            }
            Err(err) => {
                tracing::error!("Stream failed after {} chunks: {}", count, err);
                done = done.with_metadata("error", err.public_message());
                break;
            }
        }
    }

    tracing::info!("Answer streamed in {} chunks", count);
    let _ = tx.send(Ok(done.into())).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let req: AskRequest = serde_json::from_str(r#"{"question": "Why?"}"#).unwrap();
        assert_eq!(req.age, 5);
        assert!(!req.story_mode);
        assert!(req.history.is_empty());
        assert!(req.stream);
    }

    #[tokio::test]
    async fn forward_stream_reports_mid_stream_failure() {
        let (chunk_tx, chunk_rx) = mpsc::channel(4);
        chunk_tx.send(Ok("Hello".to_string())).await.unwrap();
        chunk_tx
            .send(Err(ApiError::UpstreamUnavailable("reset".into())))
            .await
            .unwrap();
        drop(chunk_tx);

        let (tx, mut rx) = mpsc::channel(8);
        forward_stream(chunk_rx, tx).await;

        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        // thinking, one text, done
        assert_eq!(count, 3);
    }
}
