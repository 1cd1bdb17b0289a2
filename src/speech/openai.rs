use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{AudioUpload, SpeechProvider};
use crate::core::errors::ApiError;
use crate::llm::provider::check_status;

const PROVIDER_NAME: &str = "openai-speech";
const TRANSCRIPTION_MODEL: &str = "whisper-1";
const SPEECH_MODEL: &str = "tts-1";
const SPEECH_VOICE: &str = "nova";

/// Whisper transcription and `tts-1` synthesis over the OpenAI audio API.
#[derive(Clone)]
pub struct OpenAiSpeech {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAiSpeech {
    pub fn new(base_url: &str, api_key: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }
}

#[async_trait]
impl SpeechProvider for OpenAiSpeech {
    async fn transcribe(&self, audio: AudioUpload) -> Result<String, ApiError> {
        let part = Part::stream(audio.data)
            .file_name(audio.file_name)
            .mime_str(&audio.content_type)
            .map_err(|e| ApiError::UnsupportedMediaType(e.to_string()))?;
        let form = Form::new()
            .text("model", TRANSCRIPTION_MODEL)
            .part("file", part);

        let res = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::upstream)?;
        let res = check_status(PROVIDER_NAME, res).await?;

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;
        let transcript = payload["text"]
            .as_str()
            .ok_or_else(|| ApiError::upstream("transcription response has no text"))?;

        Ok(transcript.trim().to_string())
    }

    async fn synthesize(&self, text: &str) -> Result<Bytes, ApiError> {
        let body = json!({
            "model": SPEECH_MODEL,
            "voice": SPEECH_VOICE,
            "input": text,
            "response_format": "mp3",
        });

        let res = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;
        let res = check_status(PROVIDER_NAME, res).await?;

        res.bytes().await.map_err(ApiError::upstream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn transcribe_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .and(header("authorization", "Bearer sk-speech"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"text": " Why do birds sing? "})),
            )
            .mount(&server)
            .await;

        let speech = OpenAiSpeech::new(&server.uri(), "sk-speech", Client::new());
        let transcript = speech
            .transcribe(AudioUpload {
                file_name: "question.webm".to_string(),
                content_type: "audio/webm".to_string(),
                data: Bytes::from_static(b"fake-audio"),
            })
            .await
            .unwrap();

        assert_eq!(transcript, "Why do birds sing?");
    }

    #[tokio::test]
    async fn synthesize_returns_audio_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .and(body_partial_json(json!({"model": "tts-1", "voice": "nova", "input": "Hello!"})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"ID3mp3".to_vec(), "audio/mpeg"))
            .mount(&server)
            .await;

        let speech = OpenAiSpeech::new(&server.uri(), "sk-speech", Client::new());
        let audio = speech.synthesize("Hello!").await.unwrap();

        assert_eq!(&audio[..], b"ID3mp3");
    }

    #[tokio::test]
    async fn upstream_rate_limit_is_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let speech = OpenAiSpeech::new(&server.uri(), "sk-speech", Client::new());
        let err = speech.synthesize("Hello!").await.unwrap_err();

        assert!(matches!(err, ApiError::UpstreamRateLimited(_)));
    }
}
