//! `ModelSelector`: `select_model(models, alias, requirements?) → model
//! name | no-capable-model`.
//!
//! Pure filter-then-rank over `&[ModelInfo]`, grounded on the same
//! capability-predicate shape `llmflow-provider::model::Capabilities`
//! exposes (itself grounded on `ai-sdk-provider`'s model-identity
//! accessors); this module supplies the scoring functions `spec.md` §4.1
//! names, which the teacher has no equivalent of since it lets callers
//! pick a model id directly rather than selecting by capability + alias.

use llmflow_provider::model::{Capabilities, ModelInfo};

use crate::error::CoreError;

/// Selection alias: a named scoring strategy over the filtered candidate
/// set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelAlias {
    Cheap,
    Fast,
    Premium,
    Balanced,
}

/// Capability/feature requirements a candidate model must satisfy to
/// survive the filter step.
#[derive(Debug, Clone, Default)]
pub struct ModelRequirements {
    pub streaming: bool,
    pub tool_calls: bool,
    pub parallel_tool_calls: bool,
    pub reasoning: bool,
    pub image_input: bool,
    pub text_output_formats: Vec<String>,
    pub image_output_generate: bool,
    pub image_output_edit: bool,
    pub embedding_dimensions: Vec<u32>,
}

impl ModelRequirements {
    fn satisfied_by(&self, caps: &Capabilities) -> bool {
        if self.streaming && !caps.streaming {
            return false;
        }
        if self.tool_calls && !caps.tool_calls.supported() {
            return false;
        }
        if self.parallel_tool_calls && !caps.parallel_tool_calls {
            return false;
        }
        if self.reasoning && !caps.reasoning {
            return false;
        }
        if self.image_input && !caps.input.image {
            return false;
        }
        for format in &self.text_output_formats {
            let supports = caps.output.text.as_ref().is_some_and(|t| t.supports(format));
            if !supports {
                return false;
            }
        }
        if self.image_output_generate && !caps.output.image.is_some_and(|i| i.generate) {
            return false;
        }
        if self.image_output_edit && !caps.output.image.is_some_and(|i| i.edit) {
            return false;
        }
        if !self.embedding_dimensions.is_empty() {
            let available = caps.output.embeddings.as_ref().map(|e| &e.dimensions);
            let all_present = available.is_some_and(|dims| self.embedding_dimensions.iter().all(|d| dims.contains(d)));
            if !all_present {
                return false;
            }
        }
        true
    }
}

/// Selects a model name from `models` per `alias`'s scoring strategy,
/// restricted to models satisfying `requirements`.
pub fn select_model(
    models: &[ModelInfo],
    alias: ModelAlias,
    requirements: &ModelRequirements,
) -> Result<String, CoreError> {
    let candidates: Vec<&ModelInfo> = models.iter().filter(|m| requirements.satisfied_by(&m.capabilities)).collect();
    if candidates.is_empty() {
        return Err(CoreError::no_capable_model(alias_name(alias)));
    }

    let scored = match alias {
        ModelAlias::Cheap => rank_cheap(&candidates),
        ModelAlias::Fast => rank_fast(&candidates),
        ModelAlias::Premium => rank_premium(&candidates),
        ModelAlias::Balanced => rank_balanced(&candidates),
    };

    scored.ok_or_else(|| CoreError::no_capable_model(alias_name(alias))).map(|m| m.name.clone())
}

fn alias_name(alias: ModelAlias) -> &'static str {
    match alias {
        ModelAlias::Cheap => "cheap",
        ModelAlias::Fast => "fast",
        ModelAlias::Premium => "premium",
        ModelAlias::Balanced => "balanced",
    }
}

fn rank_cheap<'a>(candidates: &[&'a ModelInfo]) -> Option<&'a ModelInfo> {
    candidates
        .iter()
        .copied()
        .min_by(|a, b| {
            let cost_a = a.input_price_per_million + a.output_price_per_million;
            let cost_b = b.input_price_per_million + b.output_price_per_million;
            cost_a
                .partial_cmp(&cost_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.characteristics.quality_index.cmp(&a.characteristics.quality_index))
        })
}

fn rank_fast<'a>(candidates: &[&'a ModelInfo]) -> Option<&'a ModelInfo> {
    candidates.iter().copied().max_by(|a, b| fast_score(a).partial_cmp(&fast_score(b)).unwrap_or(std::cmp::Ordering::Equal))
}

fn fast_score(m: &ModelInfo) -> f64 {
    0.7 * m.characteristics.output_speed + 0.3 * (1.0 - m.characteristics.first_token_latency / 5000.0)
}

fn rank_premium<'a>(candidates: &[&'a ModelInfo]) -> Option<&'a ModelInfo> {
    candidates
        .iter()
        .copied()
        .filter(|m| m.characteristics.quality_index >= 80)
        .max_by_key(|m| m.characteristics.quality_index)
}

/// Ideal-centric composite score used for `balanced`, matching `spec.md`
/// §4.1's "variance penalty around ideal targets" description.
fn balanced_score(m: &ModelInfo, max_cost: f64) -> f64 {
    const IDEAL_QUALITY: f64 = 0.85;
    const IDEAL_SPEED: f64 = 0.75;
    const IDEAL_LATENCY: f64 = 0.75;
    const IDEAL_COST: f64 = 0.75;

    let quality = m.characteristics.quality_index as f64 / 100.0;
    let speed = (m.characteristics.output_speed / 500.0).min(1.0);
    let latency = (1.0 - m.characteristics.first_token_latency / 25_000.0).max(0.0);
    let cost = if max_cost > 0.0 {
        1.0 - (m.input_price_per_million + m.output_price_per_million) / max_cost
    } else {
        1.0
    };

    let variance = (quality - IDEAL_QUALITY).powi(2)
        + (speed - IDEAL_SPEED).powi(2)
        + (latency - IDEAL_LATENCY).powi(2)
        + (cost - IDEAL_COST).powi(2);

    1.0 - variance
}

fn rank_balanced<'a>(candidates: &[&'a ModelInfo]) -> Option<&'a ModelInfo> {
    let eligible: Vec<&&ModelInfo> = candidates
        .iter()
        .filter(|m| {
            m.characteristics.quality_index >= 70
                && m.characteristics.output_speed >= 100.0
                && m.characteristics.first_token_latency <= 25_000.0
        })
        .collect();
    if eligible.is_empty() {
        return None;
    }
    let max_cost = eligible
        .iter()
        .map(|m| m.input_price_per_million + m.output_price_per_million)
        .fold(0.0_f64, f64::max);
    eligible
        .into_iter()
        .copied()
        .max_by(|a, b| balanced_score(a, max_cost).partial_cmp(&balanced_score(b, max_cost)).unwrap_or(std::cmp::Ordering::Equal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmflow_provider::model::Characteristics;

    fn model(name: &str, quality: u8, speed: f64, latency: f64, in_price: f64, out_price: f64) -> ModelInfo {
        ModelInfo {
            name: name.into(),
            input_price_per_million: in_price,
            input_cached_price_per_million: None,
            output_price_per_million: out_price,
            max_request_tokens: 100_000,
            max_response_tokens: 4096,
            tokenization_model: None,
            capabilities: Capabilities { streaming: true, ..Default::default() },
            characteristics: Characteristics { quality_index: quality, output_speed: speed, first_token_latency: latency },
        }
    }

    #[test]
    fn empty_candidate_set_fails_with_no_capable_model() {
        let models = vec![model("m", 10, 10.0, 1000.0, 1.0, 1.0)];
        let reqs = ModelRequirements { reasoning: true, ..Default::default() };
        assert!(matches!(select_model(&models, ModelAlias::Cheap, &reqs), Err(CoreError::NoCapableModel { .. })));
    }

    #[test]
    fn cheap_picks_lowest_combined_price() {
        let models = vec![model("expensive", 90, 100.0, 500.0, 10.0, 10.0), model("cheap", 50, 50.0, 1000.0, 0.5, 0.5)];
        let name = select_model(&models, ModelAlias::Cheap, &ModelRequirements::default()).unwrap();
        assert_eq!(name, "cheap");
    }

    #[test]
    fn fast_picks_highest_speed_latency_composite() {
        let models = vec![model("slow", 50, 10.0, 4000.0, 1.0, 1.0), model("fast", 50, 500.0, 100.0, 1.0, 1.0)];
        let name = select_model(&models, ModelAlias::Fast, &ModelRequirements::default()).unwrap();
        assert_eq!(name, "fast");
    }

    #[test]
    fn premium_excludes_below_quality_threshold() {
        let models = vec![model("mid", 79, 100.0, 500.0, 1.0, 1.0), model("top", 95, 100.0, 500.0, 1.0, 1.0)];
        let name = select_model(&models, ModelAlias::Premium, &ModelRequirements::default()).unwrap();
        assert_eq!(name, "top");
    }

    #[test]
    fn premium_fails_when_no_model_clears_threshold() {
        let models = vec![model("mid", 79, 100.0, 500.0, 1.0, 1.0)];
        assert!(matches!(
            select_model(&models, ModelAlias::Premium, &ModelRequirements::default()),
            Err(CoreError::NoCapableModel { .. })
        ));
    }

    #[test]
    fn balanced_excludes_models_outside_its_gates() {
        let models = vec![model("too_slow", 75, 50.0, 500.0, 1.0, 1.0), model("ok", 75, 200.0, 500.0, 1.0, 1.0)];
        let name = select_model(&models, ModelAlias::Balanced, &ModelRequirements::default()).unwrap();
        assert_eq!(name, "ok");
    }
}
