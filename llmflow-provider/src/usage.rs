//! Nested token/cost accounting shape.
//!
//! Grounded on `ai-sdk-provider/src/language_model/usage.rs`'s flat
//! `LanguageModelUsage`, reshaped into the nested `{tokens, costs}` envelope
//! `spec.md` §3 names — the flat teacher shape doesn't distinguish cached
//! vs. non-cached or carry cost fields at all, both of which the universal
//! envelope requires.

use serde::{Deserialize, Serialize};

fn is_zero(n: &u64) -> bool {
    *n == 0
}

fn is_zero_f64(n: &f64) -> bool {
    *n == 0.0
}

/// Input-side token counts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputTokens {
    pub total: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub cached: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<u64>,
}

/// Output-side token counts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputTokens {
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<u64>,
}

/// Token counts for one call or accumulated across a call stream.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokens {
    pub input: InputTokens,
    pub output: OutputTokens,
    pub total: u64,
}

/// Input-side cost in the provider's billing currency (USD by convention).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputCosts {
    pub total: f64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub cached: f64,
}

/// Output-side cost.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputCosts {
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<f64>,
}

/// Cost breakdown matching [`Tokens`]' shape.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Costs {
    pub input: InputCosts,
    pub output: OutputCosts,
    pub total: f64,
}

/// Full usage accounting for a call: tokens and their associated cost.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub tokens: Tokens,
    pub costs: Costs,
}

impl Usage {
    /// Adds `other`'s token and cost totals into `self`, for accumulation
    /// across multi-step tool-orchestration turns or streamed chunks.
    pub fn accumulate(&mut self, other: &Usage) {
        self.tokens.input.total += other.tokens.input.total;
        self.tokens.input.cached += other.tokens.input.cached;
        self.tokens.input.image = add_opt(self.tokens.input.image, other.tokens.input.image);
        self.tokens.output.total += other.tokens.output.total;
        self.tokens.output.reasoning = add_opt(self.tokens.output.reasoning, other.tokens.output.reasoning);
        self.tokens.output.image = add_opt(self.tokens.output.image, other.tokens.output.image);
        self.tokens.total += other.tokens.total;

        self.costs.input.total += other.costs.input.total;
        self.costs.input.cached += other.costs.input.cached;
        self.costs.output.total += other.costs.output.total;
        self.costs.output.reasoning = add_opt_f64(self.costs.output.reasoning, other.costs.output.reasoning);
        self.costs.output.image = add_opt_f64(self.costs.output.image, other.costs.output.image);
        self.costs.total += other.costs.total;
    }
}

fn add_opt(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
    }
}

fn add_opt_f64(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_sums_required_totals() {
        let mut a = Usage {
            tokens: Tokens {
                input: InputTokens { total: 10, cached: 2, image: None },
                output: OutputTokens { total: 5, reasoning: None, image: None },
                total: 15,
            },
            costs: Costs::default(),
        };
        let b = Usage {
            tokens: Tokens {
                input: InputTokens { total: 3, cached: 0, image: None },
                output: OutputTokens { total: 7, reasoning: Some(2), image: None },
                total: 10,
            },
            costs: Costs::default(),
        };
        a.accumulate(&b);
        assert_eq!(a.tokens.input.total, 13);
        assert_eq!(a.tokens.input.cached, 2);
        assert_eq!(a.tokens.output.total, 12);
        assert_eq!(a.tokens.output.reasoning, Some(2));
        assert_eq!(a.tokens.total, 25);
    }
}
