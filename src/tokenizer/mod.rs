//! Model-aware token counting.
//!
//! Resolves a model identifier to a BPE encoding and counts tokens with it.
//! Counting never fails: unknown models use [`Encoding::DEFAULT`], and if no
//! encoder can be built at all the count falls back to a character estimate.

pub mod cache;
pub mod counter;
pub mod encoding;

pub use cache::EncoderCache;
pub use counter::{count_tokens, estimate_tokens, ModelTokenCounter, TokenCounter};
pub use encoding::Encoding;
