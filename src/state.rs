use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::context::{MessageAssembler, TokenBudget};
use crate::core::config::Settings;
use crate::llm::{build_http_client, build_llm_provider, LlmProvider};
use crate::speech::{build_speech_provider, SpeechProvider};
use crate::tokenizer::{EncoderCache, ModelTokenCounter, TokenCounter};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub assembler: MessageAssembler,
    pub llm: Arc<dyn LlmProvider>,
    pub speech: Option<Arc<dyn SpeechProvider>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        assembler: MessageAssembler,
        llm: Arc<dyn LlmProvider>,
        speech: Option<Arc<dyn SpeechProvider>>,
    ) -> Arc<Self> {
        Arc::new(AppState {
            settings,
            assembler,
            llm,
            speech,
            started_at: Utc::now(),
        })
    }

    /// Wires the configured providers and tokenizer.
    pub fn initialize(settings: Settings) -> anyhow::Result<Arc<Self>> {
        let budget = TokenBudget::try_from(settings.tokens)?;
        let cache = Arc::new(EncoderCache::new());
        let counter: Arc<dyn TokenCounter> =
            Arc::new(ModelTokenCounter::new(settings.llm.model.clone(), cache));
        let assembler = MessageAssembler::new(budget, counter);

        let client = build_http_client().context("Failed to build HTTP client")?;
        let llm = build_llm_provider(&settings.llm, client.clone());
        let speech = build_speech_provider(&settings.speech, client);
        if speech.is_none() {
            tracing::warn!("No speech API key configured; /transcribe and /tts are disabled");
        }

        Ok(Self::new(settings, assembler, llm, speech))
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}
