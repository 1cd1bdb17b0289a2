use tiktoken_rs::tokenizer::{get_tokenizer, Tokenizer};
use tiktoken_rs::CoreBPE;

/// BPE encoding schemes the adapter knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    O200kBase,
    Cl100kBase,
    P50kBase,
    R50kBase,
}

impl Encoding {
    /// Used for anything the model tables do not recognise (including
    /// non-OpenAI models such as `claude-*`).
    pub const DEFAULT: Encoding = Encoding::Cl100kBase;

    pub fn for_model(model: &str) -> Self {
        match get_tokenizer(model.trim()) {
            Some(Tokenizer::O200kBase) => Encoding::O200kBase,
            Some(Tokenizer::Cl100kBase) => Encoding::Cl100kBase,
            Some(Tokenizer::P50kBase) | Some(Tokenizer::P50kEdit) => Encoding::P50kBase,
            Some(Tokenizer::R50kBase) | Some(Tokenizer::Gpt2) => Encoding::R50kBase,
            _ => Encoding::DEFAULT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::O200kBase => "o200k_base",
            Encoding::Cl100kBase => "cl100k_base",
            Encoding::P50kBase => "p50k_base",
            Encoding::R50kBase => "r50k_base",
        }
    }

    pub(crate) fn build(self) -> Result<CoreBPE, String> {
        let result = match self {
            Encoding::O200kBase => tiktoken_rs::o200k_base(),
            Encoding::Cl100kBase => tiktoken_rs::cl100k_base(),
            Encoding::P50kBase => tiktoken_rs::p50k_base(),
            Encoding::R50kBase => tiktoken_rs::r50k_base(),
        };
        result.map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_models_resolve_to_their_encoding() {
        assert_eq!(Encoding::for_model("gpt-4o"), Encoding::O200kBase);
        assert_eq!(Encoding::for_model("gpt-4"), Encoding::Cl100kBase);
        assert_eq!(Encoding::for_model("gpt-3.5-turbo"), Encoding::Cl100kBase);
    }

    #[test]
    fn unknown_models_use_default() {
        assert_eq!(
            Encoding::for_model("claude-3-5-sonnet-latest"),
            Encoding::DEFAULT
        );
        assert_eq!(Encoding::for_model(""), Encoding::DEFAULT);
        assert_eq!(Encoding::for_model("definitely-not-a-model"), Encoding::DEFAULT);
    }

    #[test]
    fn every_encoding_builds() {
        for encoding in [
            Encoding::O200kBase,
            Encoding::Cl100kBase,
            Encoding::P50kBase,
            Encoding::R50kBase,
        ] {
            assert!(encoding.build().is_ok(), "{} failed", encoding.name());
        }
    }
}
