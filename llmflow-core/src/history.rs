//! `HistoryManager`: the conversation's system message plus its ordered
//! message list, with an optional dynamic truncation mode.
//!
//! No direct teacher equivalent (the teacher's `Prompt`/message types
//! are request-scoped, not held across calls); grounded on
//! `llmflow_provider::message::UniversalMessage` for the per-message
//! shape and on `spec.md` §4.11's `addMessage`/dynamic-truncation/
//! serialize-round-trip contract for the manager itself.

use llmflow_provider::message::{Role, UniversalMessage};

use crate::token::TokenCalculator;

/// How [`HistoryManager::messages_for_request`] trims history before a
/// provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    /// Expose the full message list unmodified.
    #[default]
    Full,
    /// Drop the oldest non-system messages until the remaining messages'
    /// token estimate fits within a budget.
    Dynamic,
}

/// Holds the system message and the ordered conversation history for one
/// caller instance.
#[derive(Debug, Clone, Default)]
pub struct HistoryManager {
    system: Option<String>,
    messages: Vec<UniversalMessage>,
    mode: HistoryMode,
}

impl HistoryManager {
    pub fn new(mode: HistoryMode) -> Self {
        Self { system: None, messages: Vec::new(), mode }
    }

    pub fn set_system(&mut self, system: impl Into<String>) {
        self.system = Some(system.into());
    }

    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn add_message(&mut self, message: UniversalMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[UniversalMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Preserves the system message and the most-recent `keep` messages,
    /// dropping everything older — the trim step `ToolOrchestrator`
    /// applies when history exceeds its configured maximum length.
    pub fn trim_to_most_recent(&mut self, keep: usize) {
        if self.messages.len() > keep {
            let drop_count = self.messages.len() - keep;
            self.messages.drain(0..drop_count);
        }
    }

    /// Returns the messages a provider call should see: the full list
    /// under [`HistoryMode::Full`], or the oldest-first-dropped subset
    /// that fits `max_request_tokens - margin` under
    /// [`HistoryMode::Dynamic`].
    pub fn messages_for_request(&self, counter: &TokenCalculator, max_request_tokens: u64, margin: u64, tokenization_model: Option<&str>) -> Vec<UniversalMessage> {
        if self.mode == HistoryMode::Full {
            return self.messages.clone();
        }

        let budget = max_request_tokens.saturating_sub(margin);
        let mut kept: Vec<UniversalMessage> = Vec::new();
        let mut total: u64 = 0;

        for message in self.messages.iter().rev() {
            let tokens = counter.count(&message.content.as_text(), tokenization_model);
            if !kept.is_empty() && total + tokens > budget {
                break;
            }
            total += tokens;
            kept.push(message.clone());
        }
        kept.reverse();
        kept
    }

    /// A flat serializable form of the non-system message list, for
    /// persistence between process runs.
    pub fn serialize_history(&self) -> Vec<UniversalMessage> {
        self.messages.clone()
    }

    /// Replaces the message list from a previously serialized form,
    /// leaving `system` untouched.
    pub fn deserialize_history(&mut self, messages: Vec<UniversalMessage>) {
        self.messages = messages;
    }

    /// Convenience wrapper matching `spec.md`'s
    /// `addMessage(role, content, extras?)` signature for tool-result and
    /// plain-text messages.
    pub fn add_text_message(&mut self, role: Role, content: impl Into<String>) {
        self.add_message(UniversalMessage::text(role, content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mode_exposes_everything() {
        let mut history = HistoryManager::new(HistoryMode::Full);
        history.add_text_message(Role::User, "hi");
        history.add_text_message(Role::Assistant, "hello");
        let calc = TokenCalculator::new();
        assert_eq!(history.messages_for_request(&calc, 10, 0, None).len(), 2);
    }

    #[test]
    fn dynamic_mode_drops_oldest_to_fit_budget() {
        let mut history = HistoryManager::new(HistoryMode::Dynamic);
        for i in 0..20 {
            history.add_text_message(Role::User, format!("message number {i} with padding text"));
        }
        let calc = TokenCalculator::new();
        let kept = history.messages_for_request(&calc, 20, 0, None);
        assert!(kept.len() < 20);
        // most recent message must survive
        assert!(kept.last().unwrap().content.as_text().contains("19"));
    }

    #[test]
    fn trim_preserves_most_recent_messages() {
        let mut history = HistoryManager::new(HistoryMode::Full);
        for i in 0..10 {
            history.add_text_message(Role::User, format!("m{i}"));
        }
        history.trim_to_most_recent(3);
        assert_eq!(history.len(), 3);
        assert_eq!(history.messages()[0].content.as_text(), "m7");
    }

    #[test]
    fn serialize_deserialize_round_trips() {
        let mut history = HistoryManager::new(HistoryMode::Full);
        history.add_text_message(Role::User, "hi");
        let serialized = history.serialize_history();
        let mut restored = HistoryManager::new(HistoryMode::Full);
        restored.deserialize_history(serialized);
        assert_eq!(restored.len(), 1);
    }
}
