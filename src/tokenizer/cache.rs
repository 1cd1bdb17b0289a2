use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tiktoken_rs::CoreBPE;

use super::encoding::Encoding;

/// Process-wide encoder cache, one entry per encoding scheme.
///
/// Encoders are built on first use and then only read. Two requests racing on
/// the first use of a scheme may both build an encoder; the first insert wins
/// and the other copy is dropped, which is harmless since encoders are
/// stateless.
#[derive(Default)]
pub struct EncoderCache {
    encoders: RwLock<HashMap<Encoding, Arc<CoreBPE>>>,
}

impl EncoderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached encoder, building it if needed. `None` only when
    /// the encoding data cannot be loaded.
    pub fn encoder(&self, encoding: Encoding) -> Option<Arc<CoreBPE>> {
        if let Some(existing) = self
            .encoders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&encoding)
        {
            return Some(existing.clone());
        }

        let built = match encoding.build() {
            Ok(bpe) => Arc::new(bpe),
            Err(err) => {
                tracing::warn!("Failed to build {} encoder: {}", encoding.name(), err);
                return None;
            }
        };

        let mut encoders = self
            .encoders
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Some(encoders.entry(encoding).or_insert(built).clone())
    }

    pub fn len(&self) -> usize {
        self.encoders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for EncoderCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoders = self
            .encoders
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EncoderCache")
            .field("encodings", &encoders.keys().map(|e| e.name()).collect::<Vec<_>>())
            .finish()
    }
}
