use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const REDACT_PLACEHOLDER: &str = "****";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Which chat-completion backend answers questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => DEFAULT_OPENAI_BASE_URL,
            ProviderKind::Anthropic => DEFAULT_ANTHROPIC_BASE_URL,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(format!(
                "unknown provider '{}', expected 'openai' or 'anthropic'",
                other
            )),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            base_url: None,
            request_timeout_secs: 60,
        }
    }
}

impl LlmSettings {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Context-window budget. `response_reserved_tokens` must stay below
/// `max_total_tokens`; the loader refuses anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    pub max_total_tokens: usize,
    pub response_reserved_tokens: usize,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            max_total_tokens: 2048,
            response_reserved_tokens: 1500,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

impl SpeechSettings {
    /// The key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_allowed_origins: default_local_origins(),
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete service configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub tokens: TokenSettings,
    pub speech: SpeechSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

pub fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

fn redact(value: &str) -> &str {
    if value.is_empty() {
        ""
    } else {
        REDACT_PLACEHOLDER
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl fmt::Debug for SpeechSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechSettings")
            .field("api_key", &self.api_key.as_deref().map(redact))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("llm", &self.llm)
            .field("tokens", &self.tokens)
            .field("speech", &self.speech)
            .field("server", &self.server)
            .field("logging", &self.logging)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<ProviderKind>(), Ok(ProviderKind::OpenAi));
        assert_eq!(
            " anthropic ".parse::<ProviderKind>(),
            Ok(ProviderKind::Anthropic)
        );
        assert!("ollama".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn debug_output_redacts_api_keys() {
        let mut settings = Settings::default();
        settings.llm.api_key = "sk-live-secret".to_string();
        settings.speech.api_key = Some("sk-speech-secret".to_string());

        let rendered = format!("{:?}", settings);

        assert!(!rendered.contains("sk-live-secret"));
        assert!(!rendered.contains("sk-speech-secret"));
        assert!(rendered.contains(REDACT_PLACEHOLDER));
        assert!(rendered.contains("gpt-4o"));
    }

    #[test]
    fn base_url_falls_back_to_provider_default() {
        let mut llm = LlmSettings::default();
        assert_eq!(llm.base_url(), DEFAULT_OPENAI_BASE_URL);

        llm.provider = ProviderKind::Anthropic;
        assert_eq!(llm.base_url(), DEFAULT_ANTHROPIC_BASE_URL);

        llm.base_url = Some("http://localhost:9999".to_string());
        assert_eq!(llm.base_url(), "http://localhost:9999");
    }

    #[test]
    fn blank_speech_key_counts_as_missing() {
        let speech = SpeechSettings {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(speech.api_key(), None);
    }
}
