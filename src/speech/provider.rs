use async_trait::async_trait;
use axum::body::Bytes;

use crate::core::errors::ApiError;

/// An uploaded recording, already checked by [`super::validate_audio`].
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Speech to text.
    async fn transcribe(&self, audio: AudioUpload) -> Result<String, ApiError>;

    /// Text to MP3 audio.
    async fn synthesize(&self, text: &str) -> Result<Bytes, ApiError>;
}
