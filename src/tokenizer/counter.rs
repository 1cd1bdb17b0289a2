use std::sync::Arc;

use super::cache::EncoderCache;
use super::encoding::Encoding;

/// Counts tokens in a piece of text.
///
/// Implemented for any `Fn(&str) -> usize`, which keeps budget tests free of
/// real encoders.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

impl<F> TokenCounter for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn count_tokens(&self, text: &str) -> usize {
        self(text)
    }
}

/// Counter bound to one model's encoding, resolved at construction.
#[derive(Debug, Clone)]
pub struct ModelTokenCounter {
    model: String,
    encoding: Encoding,
    cache: Arc<EncoderCache>,
}

impl ModelTokenCounter {
    pub fn new(model: impl Into<String>, cache: Arc<EncoderCache>) -> Self {
        let model = model.into();
        let encoding = Encoding::for_model(&model);
        Self {
            model,
            encoding,
            cache,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl TokenCounter for ModelTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        count_with_encoding(&self.cache, self.encoding, text)
    }
}

/// One-shot count for `model`, using (and filling) `cache`.
pub fn count_tokens(cache: &EncoderCache, model: &str, text: &str) -> usize {
    count_with_encoding(cache, Encoding::for_model(model), text)
}

fn count_with_encoding(cache: &EncoderCache, encoding: Encoding, text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    let encoder = cache.encoder(encoding).or_else(|| {
        if encoding == Encoding::DEFAULT {
            None
        } else {
            cache.encoder(Encoding::DEFAULT)
        }
    });

    match encoder {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => estimate_tokens(text),
    }
}

/// Rough estimate: ~4 bytes of English text per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}
