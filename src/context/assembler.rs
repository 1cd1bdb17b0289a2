use std::sync::Arc;

use crate::llm::types::{ChatMessage, ChatRole};
use crate::tokenizer::TokenCounter;

use super::history::HistoryMessage;
use super::window::{trim_history, TokenBudget};

/// Final message list for one completion call:
/// `[system] + trimmed history + [question]`.
#[derive(Debug, Clone)]
pub struct AssembledMessageSequence {
    messages: Vec<ChatMessage>,
    pub history_budget: i64,
    pub history_tokens: usize,
    pub dropped_turns: usize,
}

impl AssembledMessageSequence {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of history turns carried between the system prompt and question.
    pub fn history_len(&self) -> usize {
        self.messages.len().saturating_sub(2)
    }
}

/// Builds request messages within the configured context window.
///
/// The counter is the configured model's, chosen once at startup.
#[derive(Clone)]
pub struct MessageAssembler {
    budget: TokenBudget,
    counter: Arc<dyn TokenCounter>,
}

impl MessageAssembler {
    pub fn new(budget: TokenBudget, counter: Arc<dyn TokenCounter>) -> Self {
        Self { budget, counter }
    }

    pub fn budget(&self) -> TokenBudget {
        self.budget
    }

    pub fn assemble(
        &self,
        system_prompt: &str,
        history: &[HistoryMessage],
        question: &str,
    ) -> AssembledMessageSequence {
        let system_tokens = self.counter.count_tokens(system_prompt);
        let question_tokens = self.counter.count_tokens(question);
        let history_budget = self.budget.history_budget(system_tokens, question_tokens);

        let trimmed = trim_history(history, history_budget, self.counter.as_ref());

        let mut messages = Vec::with_capacity(trimmed.messages.len() + 2);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(trimmed.messages.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(question));

        debug_assert_eq!(messages.first().map(|m| m.role), Some(ChatRole::System));

        AssembledMessageSequence {
            messages,
            history_budget,
            history_tokens: trimmed.tokens_used,
            dropped_turns: trimmed.dropped,
        }
    }
}
