pub mod anthropic;
pub mod openai;
pub mod provider;
pub mod sse;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::core::config::{settings::LlmSettings, ProviderKind};

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use provider::{ChatStream, LlmProvider};
pub use types::{ChatMessage, ChatRequest, ChatRole};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP client for upstream providers.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder().connect_timeout(CONNECT_TIMEOUT).build()
}

/// Selects the configured backend once, at startup.
pub fn build_llm_provider(settings: &LlmSettings, client: Client) -> Arc<dyn LlmProvider> {
    let base_url = settings.base_url();
    let timeout = settings.request_timeout();
    match settings.provider {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(
            base_url,
            settings.api_key.clone(),
            client,
            timeout,
        )),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(
            base_url,
            settings.api_key.clone(),
            client,
            timeout,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: ProviderKind) -> LlmSettings {
        LlmSettings {
            provider,
            api_key: "key".to_string(),
            ..LlmSettings::default()
        }
    }

    #[test]
    fn selects_provider_by_kind() {
        let client = build_http_client().unwrap();
        assert_eq!(
            build_llm_provider(&settings(ProviderKind::OpenAi), client.clone()).name(),
            "openai"
        );
        assert_eq!(
            build_llm_provider(&settings(ProviderKind::Anthropic), client).name(),
            "anthropic"
        );
    }
}
