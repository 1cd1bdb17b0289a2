//! Context window budgeting.
//!
//! Decides how much conversation history fits next to the system prompt, the
//! new question and the space reserved for the model's answer, and selects
//! which turns to keep.

use crate::core::config::settings::TokenSettings;
use crate::core::config::ConfigError;
use crate::tokenizer::TokenCounter;

use super::history::{HistoryMessage, TurnRole};

/// Validated context-window limits.
///
/// Construction guarantees `response_reserved_tokens < max_total_tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    max_total_tokens: usize,
    response_reserved_tokens: usize,
}

impl TokenBudget {
    pub fn new(max_total_tokens: usize, response_reserved_tokens: usize) -> Result<Self, ConfigError> {
        if response_reserved_tokens >= max_total_tokens {
            return Err(ConfigError::Invalid {
                path: "tokens.response_reserved_tokens".to_string(),
                message: format!(
                    "response_reserved_tokens ({}) must be less than max_total_tokens ({})",
                    response_reserved_tokens, max_total_tokens
                ),
            });
        }
        Ok(Self {
            max_total_tokens,
            response_reserved_tokens,
        })
    }

    pub fn max_total_tokens(&self) -> usize {
        self.max_total_tokens
    }

    pub fn response_reserved_tokens(&self) -> usize {
        self.response_reserved_tokens
    }

    /// Tokens left for history. Negative when the prompt and question alone
    /// overrun the window; callers treat that as "no history".
    pub fn history_budget(&self, system_prompt_tokens: usize, question_tokens: usize) -> i64 {
        signed(self.max_total_tokens)
            .saturating_sub(signed(system_prompt_tokens))
            .saturating_sub(signed(question_tokens))
            .saturating_sub(signed(self.response_reserved_tokens))
    }
}

impl TryFrom<TokenSettings> for TokenBudget {
    type Error = ConfigError;

    fn try_from(settings: TokenSettings) -> Result<Self, Self::Error> {
        TokenBudget::new(settings.max_total_tokens, settings.response_reserved_tokens)
    }
}

fn signed(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// The turns kept by [`trim_history`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimmedHistory<'a> {
    /// Contiguous, chronological suffix of the input.
    pub messages: &'a [HistoryMessage],
    pub tokens_used: usize,
    /// Number of older turns left out.
    pub dropped: usize,
}

impl<'a> TrimmedHistory<'a> {
    fn empty(history: &'a [HistoryMessage]) -> Self {
        Self {
            messages: &history[history.len()..],
            tokens_used: 0,
            dropped: history.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Keeps the most recent turns that fit in `budget` tokens.
///
/// Works backwards from the newest turn. An assistant turn directly preceded
/// by a user turn is admitted or rejected together with it; any other turn
/// stands alone. The walk stops at the first unit that does not fit, so the
/// result is always a suffix and a pair is never split. Content is never
/// truncated.
pub fn trim_history<'a, C>(history: &'a [HistoryMessage], budget: i64, counter: &C) -> TrimmedHistory<'a>
where
    C: TokenCounter + ?Sized,
{
    let limit = match usize::try_from(budget) {
        Ok(limit) if limit > 0 => limit,
        _ => return TrimmedHistory::empty(history),
    };

    let mut start = history.len();
    let mut used = 0usize;

    while start > 0 {
        let unit_start = unit_start(history, start);
        let cost: usize = history[unit_start..start]
            .iter()
            .map(|message| counter.count_tokens(message.content()))
            .sum();

        if used.saturating_add(cost) > limit {
            break;
        }

        used += cost;
        start = unit_start;
    }

    TrimmedHistory {
        messages: &history[start..],
        tokens_used: used,
        dropped: start,
    }
}

/// Start index of the unit ending just before `end`.
fn unit_start(history: &[HistoryMessage], end: usize) -> usize {
    let last = end - 1;
    if last > 0
        && history[last].role() == TurnRole::Assistant
        && history[last - 1].role() == TurnRole::User
    {
        last - 1
    } else {
        last
    }
}
