//! Speech-to-text and text-to-speech for the voice UI.

pub mod openai;
pub mod provider;
pub mod validation;

use std::sync::Arc;

use reqwest::Client;

use crate::core::config::settings::SpeechSettings;

pub use openai::OpenAiSpeech;
pub use provider::{AudioUpload, SpeechProvider};
pub use validation::{validate_audio, validate_tts_text, MAX_AUDIO_BYTES, MAX_TTS_CHARS};

/// `None` when no speech key is configured; the routes then answer 503.
pub fn build_speech_provider(
    settings: &SpeechSettings,
    client: Client,
) -> Option<Arc<dyn SpeechProvider>> {
    let api_key = settings.api_key()?;
    Some(Arc::new(OpenAiSpeech::new(&settings.base_url, api_key, client)))
}
