//! `TokenCalculator`: pure token counting with a heuristic fallback for
//! unrecognized tokenization models.
//!
//! The teacher has no tokenizer abstraction of its own — provider crates
//! call out to vendor SDKs directly. This module is grounded on the
//! general shape of a pluggable counter instead (a trait with a
//! registered-implementation map, the same pattern `ModelRegistry` below
//! uses for `ModelInfo`), since `spec.md` §2 explicitly scopes the real
//! tokenizer library out of the core and asks only for the seam plus a
//! fallback.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Counts tokens in a string under some named tokenization scheme.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> u64;
}

/// `chars / 4`, rounded up — the heuristic every unknown tokenization
/// model name falls back to.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count(&self, text: &str) -> u64 {
        text.chars().count().div_ceil(4) as u64
    }
}

/// Registry of named counters (e.g. `"cl100k_base"`, `"o200k_base"`)
/// consulted by `ModelInfo.tokenization_model`, falling back to
/// [`HeuristicCounter`] for names with no registered implementation.
#[derive(Clone)]
pub struct TokenCalculator {
    counters: Arc<RwLock<HashMap<String, Arc<dyn TokenCounter>>>>,
    fallback: Arc<dyn TokenCounter>,
}

impl Default for TokenCalculator {
    fn default() -> Self {
        Self { counters: Arc::new(RwLock::new(HashMap::new())), fallback: Arc::new(HeuristicCounter) }
    }
}

impl TokenCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a counter under a tokenization model name, consulted
    /// whenever [`Self::count`] is called with `Some(name)`.
    pub fn register(&self, name: impl Into<String>, counter: Arc<dyn TokenCounter>) {
        self.counters.write().expect("token counter registry lock poisoned").insert(name.into(), counter);
    }

    /// Counts tokens in `text` under `tokenization_model`, falling back to
    /// the heuristic counter when the name is `None` or unregistered.
    pub fn count(&self, text: &str, tokenization_model: Option<&str>) -> u64 {
        if let Some(name) = tokenization_model {
            if let Some(counter) = self.counters.read().expect("token counter registry lock poisoned").get(name) {
                return counter.count(text);
            }
        }
        self.fallback.count(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_rounds_up_to_nearest_four_chars() {
        let calc = TokenCalculator::new();
        assert_eq!(calc.count("abcd", None), 1);
        assert_eq!(calc.count("abcde", None), 2);
        assert_eq!(calc.count("", None), 0);
    }

    struct FixedCounter(u64);
    impl TokenCounter for FixedCounter {
        fn count(&self, _text: &str) -> u64 {
            self.0
        }
    }

    #[test]
    fn registered_counter_takes_priority_over_heuristic() {
        let calc = TokenCalculator::new();
        calc.register("custom", Arc::new(FixedCounter(42)));
        assert_eq!(calc.count("irrelevant", Some("custom")), 42);
        assert_eq!(calc.count("irrelevant", Some("unregistered")), 3);
    }
}
