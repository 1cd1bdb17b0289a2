//! Context management for one `/ask` call.
//!
//! Validates inbound history, builds the persona prompt, and fits the
//! conversation into the model's token window.

pub mod assembler;
pub mod history;
pub mod prompt;
pub mod window;

pub use assembler::{AssembledMessageSequence, MessageAssembler};
pub use history::{validate_history, HistoryError, HistoryMessage, RawHistoryEntry, TurnRole};
pub use prompt::{build_system_prompt, AgeBand};
pub use window::{trim_history, TokenBudget, TrimmedHistory};
