use super::service::ConfigError;
use super::settings::Settings;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 3_600;

pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let tokens = &settings.tokens;
    if tokens.max_total_tokens == 0 {
        return Err(invalid("tokens.max_total_tokens", "must be greater than 0"));
    }
    if tokens.response_reserved_tokens == 0 {
        return Err(invalid(
            "tokens.response_reserved_tokens",
            "must be greater than 0",
        ));
    }
    if tokens.response_reserved_tokens >= tokens.max_total_tokens {
        return Err(invalid(
            "tokens.response_reserved_tokens",
            &format!(
                "response_reserved_tokens ({}) must be less than max_total_tokens ({})",
                tokens.response_reserved_tokens, tokens.max_total_tokens
            ),
        ));
    }

    let llm = &settings.llm;
    validate_non_empty("llm.api_key", &llm.api_key)?;
    validate_non_empty("llm.model", &llm.model)?;
    if let Some(base_url) = &llm.base_url {
        validate_http_url("llm.base_url", base_url)?;
    }
    if llm.request_timeout_secs == 0 || llm.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
        return Err(invalid(
            "llm.request_timeout_secs",
            &format!("must be between 1 and {}", MAX_REQUEST_TIMEOUT_SECS),
        ));
    }

    validate_http_url("speech.base_url", &settings.speech.base_url)?;

    let server = &settings.server;
    validate_non_empty("server.host", &server.host)?;
    for (index, origin) in server.cors_allowed_origins.iter().enumerate() {
        validate_non_empty(&format!("server.cors_allowed_origins[{}]", index), origin)?;
    }

    validate_non_empty("logging.level", &settings.logging.level)?;

    Ok(())
}

fn validate_non_empty(path: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(path, "value cannot be empty"));
    }
    Ok(())
}

fn validate_http_url(path: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(invalid(path, "expected an http:// or https:// URL"));
    }
    Ok(())
}

fn invalid(path: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        path: path.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.llm.api_key = "sk-test".to_string();
        settings
    }

    #[test]
    fn accepts_defaults_with_api_key() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn rejects_reserve_equal_to_total() {
        let mut settings = valid_settings();
        settings.tokens.max_total_tokens = 1000;
        settings.tokens.response_reserved_tokens = 1000;

        let err = validate_settings(&settings).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("response_reserved_tokens (1000)"));
        assert!(message.contains("max_total_tokens (1000)"));
    }

    #[test]
    fn rejects_reserve_above_total() {
        let mut settings = valid_settings();
        settings.tokens.max_total_tokens = 500;
        settings.tokens.response_reserved_tokens = 600;
        assert!(matches!(
            validate_settings(&settings),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_missing_api_key() {
        let settings = Settings::default();
        let err = validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("llm.api_key"));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut settings = valid_settings();
        settings.llm.base_url = Some("ftp://example.com".to_string());
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut settings = valid_settings();
        settings.llm.request_timeout_secs = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn rejects_blank_cors_origin() {
        let mut settings = valid_settings();
        settings.server.cors_allowed_origins = vec!["http://localhost:3000".into(), " ".into()];
        let err = validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("cors_allowed_origins[1]"));
    }
}
