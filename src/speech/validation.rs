use crate::core::errors::ApiError;

/// Largest recording the transcription upstream accepts.
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Longest input the synthesis upstream accepts, in characters.
pub const MAX_TTS_CHARS: usize = 4096;

pub fn validate_audio(content_type: Option<&str>, len: usize) -> Result<(), ApiError> {
    let content_type = content_type.unwrap_or_default();
    if !content_type.starts_with("audio/") {
        return Err(ApiError::UnsupportedMediaType(format!(
            "Expected an audio file, got '{}'",
            content_type
        )));
    }
    if len == 0 {
        return Err(ApiError::BadRequest("Audio file is empty".to_string()));
    }
    if len > MAX_AUDIO_BYTES {
        return Err(ApiError::PayloadTooLarge(format!(
            "Audio file exceeds {} MB",
            MAX_AUDIO_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

pub fn validate_tts_text(text: &str) -> Result<(), ApiError> {
    if text.is_empty() {
        return Err(ApiError::Unprocessable("Text must not be empty".to_string()));
    }
    let chars = text.chars().count();
    if chars > MAX_TTS_CHARS {
        return Err(ApiError::Unprocessable(format!(
            "Text is {} characters; the limit is {}",
            chars, MAX_TTS_CHARS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_guards() {
        assert!(validate_audio(Some("audio/webm"), 10).is_ok());
        assert!(matches!(
            validate_audio(Some("text/plain"), 10),
            Err(ApiError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            validate_audio(None, 10),
            Err(ApiError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            validate_audio(Some("audio/wav"), 0),
            Err(ApiError::BadRequest(_))
        ));
        assert!(validate_audio(Some("audio/wav"), MAX_AUDIO_BYTES).is_ok());
        assert!(matches!(
            validate_audio(Some("audio/wav"), MAX_AUDIO_BYTES + 1),
            Err(ApiError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn tts_text_bounds() {
        assert!(validate_tts_text("Hi!").is_ok());
        assert!(validate_tts_text(&"é".repeat(MAX_TTS_CHARS)).is_ok());
        assert!(validate_tts_text("").is_err());
        assert!(validate_tts_text("  \n").is_ok());
        assert!(matches!(
            validate_tts_text(&"a".repeat(MAX_TTS_CHARS + 1)),
            Err(ApiError::Unprocessable(_))
        ));
    }
}
