use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::speech::{validate_audio, AudioUpload, SpeechProvider};
use crate::state::AppState;

const AUDIO_FIELD: &str = "audio";
const DEFAULT_FILE_NAME: &str = "audio.webm";

pub(crate) fn speech_provider(state: &AppState) -> Result<Arc<dyn SpeechProvider>, ApiError> {
    state
        .speech
        .clone()
        .ok_or_else(|| ApiError::ServiceUnavailable("Speech services are not configured".to_string()))
}

fn multipart_error(err: MultipartError) -> ApiError {
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else if status.is_server_error() {
        ApiError::internal(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

pub async fn transcribe(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let speech = speech_provider(&state)?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().unwrap_or(DEFAULT_FILE_NAME).to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        validate_audio(content_type.as_deref(), data.len())?;

        tracing::info!("Transcribing {} ({} bytes)", file_name, data.len());
        let transcript = speech
            .transcribe(AudioUpload {
                file_name,
                content_type: content_type.unwrap_or_default(),
                data,
            })
            .await?;

        return Ok(Json(json!({ "transcript": transcript })));
    }

    Err(ApiError::BadRequest(format!(
        "Missing '{}' file field",
        AUDIO_FIELD
    )))
}
