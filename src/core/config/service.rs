use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use super::paths::AppPaths;
use super::settings::Settings;
use super::validation::validate_settings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for environment variable {key}: {message}")]
    Env { key: String, message: String },

    #[error("Invalid config at '{path}': {message}")]
    Invalid { path: String, message: String },
}

/// Loads [`Settings`] from YAML plus environment overrides.
#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("ELI_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    /// Reads, overrides and validates. Any problem is fatal for startup.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        load_settings(&self.config_path(), |key| env::var(key).ok())
    }
}

pub fn load_settings<F>(path: &Path, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = load_yaml_file(path)?;
    apply_env_overrides(&mut settings, lookup)?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn load_yaml_file(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config file at {}; using defaults", path.display());
        return Ok(Settings::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }

    serde_yaml::from_str::<Settings>(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(value) = get("LLM_PROVIDER") {
        settings.llm.provider = value.parse().map_err(|message| ConfigError::Env {
            key: "LLM_PROVIDER".to_string(),
            message,
        })?;
    }
    if let Some(value) = get("LLM_API_KEY") {
        settings.llm.api_key = value;
    }
    if let Some(value) = get("LLM_MODEL") {
        settings.llm.model = value;
    }
    if let Some(value) = get("LLM_BASE_URL") {
        settings.llm.base_url = Some(value);
    }
    if let Some(value) = get("REQUEST_TIMEOUT_SECS") {
        settings.llm.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", &value)?;
    }
    if let Some(value) = get("MAX_TOTAL_TOKENS") {
        settings.tokens.max_total_tokens = parse_env("MAX_TOTAL_TOKENS", &value)?;
    }
    if let Some(value) = get("RESPONSE_RESERVED_TOKENS") {
        settings.tokens.response_reserved_tokens =
            parse_env("RESPONSE_RESERVED_TOKENS", &value)?;
    }
    if let Some(value) = get("STT_API_KEY") {
        settings.speech.api_key = Some(value);
    }
    if let Some(value) = get("SPEECH_BASE_URL") {
        settings.speech.base_url = value;
    }
    if let Some(value) = get("HOST") {
        settings.server.host = value;
    }
    if let Some(value) = get("PORT") {
        settings.server.port = parse_env("PORT", &value)?;
    }
    if let Some(value) = get("CORS_ALLOWED_ORIGINS") {
        settings.server.cors_allowed_origins = value
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(value) = get("LOG_LEVEL") {
        settings.logging.level = value;
    }

    Ok(())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|err| ConfigError::Env {
        key: key.to_string(),
        message: format!("'{}': {}", value, err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::settings::ProviderKind;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_uses_defaults_with_env_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yml");

        let settings = load_settings(&path, env_from(&[("LLM_API_KEY", "sk-env")])).unwrap();

        assert_eq!(settings.llm.api_key, "sk-env");
        assert_eq!(settings.llm.model, "gpt-4o");
        assert_eq!(settings.tokens.max_total_tokens, 2048);
        assert_eq!(settings.tokens.response_reserved_tokens, 1500);
        assert_eq!(settings.server.port, 8000);
    }

    #[test]
    fn yaml_values_are_loaded() {
        let (_dir, path) = write_config(
            "llm:\n  provider: anthropic\n  api_key: sk-yaml\n  model: claude-sonnet-4\n\
             tokens:\n  max_total_tokens: 8000\n  response_reserved_tokens: 1000\n",
        );

        let settings = load_settings(&path, env_from(&[])).unwrap();

        assert_eq!(settings.llm.provider, ProviderKind::Anthropic);
        assert_eq!(settings.llm.model, "claude-sonnet-4");
        assert_eq!(settings.tokens.max_total_tokens, 8000);
        assert_eq!(settings.tokens.response_reserved_tokens, 1000);
    }

    #[test]
    fn env_overrides_yaml() {
        let (_dir, path) = write_config("llm:\n  api_key: sk-yaml\n  model: gpt-4o\n");

        let settings = load_settings(
            &path,
            env_from(&[
                ("LLM_MODEL", "gpt-4o-mini"),
                ("PORT", "9001"),
                ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.llm.model, "gpt-4o-mini");
        assert_eq!(settings.llm.api_key, "sk-yaml");
        assert_eq!(settings.server.port, 9001);
        assert_eq!(
            settings.server.cors_allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn inconsistent_budget_fails_at_load() {
        let (_dir, path) = write_config(
            "llm:\n  api_key: sk\ntokens:\n  max_total_tokens: 1000\n  response_reserved_tokens: 1500\n",
        );

        let err = load_settings(&path, env_from(&[])).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err
            .to_string()
            .contains("must be less than max_total_tokens (1000)"));
    }

    #[test]
    fn reserve_from_env_is_validated_against_yaml_total() {
        let (_dir, path) = write_config("llm:\n  api_key: sk\ntokens:\n  max_total_tokens: 4096\n");

        let err = load_settings(&path, env_from(&[("RESPONSE_RESERVED_TOKENS", "5000")]));

        assert!(err.is_err());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let (_dir, path) = write_config("llm: [unclosed");
        assert!(matches!(
            load_settings(&path, env_from(&[])),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn non_numeric_env_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(
            &dir.path().join("none.yml"),
            env_from(&[("LLM_API_KEY", "sk"), ("MAX_TOTAL_TOKENS", "lots")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env { ref key, .. } if key == "MAX_TOTAL_TOKENS"));
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(
            &dir.path().join("none.yml"),
            env_from(&[("LLM_API_KEY", "sk"), ("LLM_PROVIDER", "ollama")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown provider 'ollama'"));
    }
}
