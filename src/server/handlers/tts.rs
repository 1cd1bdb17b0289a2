use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::transcribe::speech_provider;
use crate::core::errors::ApiError;
use crate::speech::validate_tts_text;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
}

pub async fn tts(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TtsRequest>,
) -> Result<Response, ApiError> {
    let speech = speech_provider(&state)?;
    validate_tts_text(&req.text)?;

    let audio = speech.synthesize(&req.text).await?;
    tracing::info!("Synthesized {} bytes of speech", audio.len());

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}
