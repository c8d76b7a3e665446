//! `ResponseProcessor`: `validate_response` (JSON parse/repair/unwrap/
//! schema-validate) and `validate_json_mode` (native-vs-prompt policy).
//!
//! No teacher equivalent (the teacher returns raw model text; structured
//! output enforcement is new territory `spec.md` §4.9 asks for). Built
//! directly on [`crate::schema`] for parsing/repair/validation and on
//! [`llmflow_provider::model::Capabilities`] for the native-JSON check.
//!
//! # Open Question decision: JSON repair under `native-only`
//!
//! `spec.md` §9 leaves open whether a `native-only` call that still
//! returns unparseable JSON should fall back to repair. Decision: no.
//! Under `JsonMode::NativeOnly` an unparseable response is a terminal
//! parse failure; repair is reserved for `Fallback` and `ForcePrompt`,
//! where the caller has already accepted that the model may miss the
//! schema and prompting/repair is the agreed mitigation.

use llmflow_provider::model::ModelInfo;
use llmflow_provider::params::{GenerationSettings, JsonMode};
use llmflow_provider::response::FinishReason;
use serde_json::Value;

use crate::error::{CoreError, SchemaValidationError};
use crate::schema;

/// Whether a call should inject a prompt-based JSON instruction, decided
/// by `validate_json_mode` from the model's native capability and the
/// requested [`JsonMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonModeDecision {
    pub use_prompt_injection: bool,
}

/// `spec.md` §4.9's `validateJsonMode`: fails outright under
/// `NativeOnly` when the model has no native structured-output support;
/// otherwise decides whether prompt injection is needed.
pub fn validate_json_mode(model_info: &ModelInfo, generation: &GenerationSettings) -> Result<JsonModeDecision, CoreError> {
    if generation.response_schema.is_none() {
        return Ok(JsonModeDecision { use_prompt_injection: false });
    }

    let has_native_json = model_info.capabilities.output.text.as_ref().is_some_and(|t| t.supports("json"));
    let mode = generation.json_mode.unwrap_or_default();

    match mode {
        JsonMode::NativeOnly if !has_native_json => Err(CoreError::NativeJsonModeUnsupported { model_name: model_info.name.clone() }),
        JsonMode::NativeOnly => Ok(JsonModeDecision { use_prompt_injection: false }),
        JsonMode::ForcePrompt => Ok(JsonModeDecision { use_prompt_injection: true }),
        JsonMode::Fallback => Ok(JsonModeDecision { use_prompt_injection: !has_native_json }),
    }
}

/// Outcome of [`validate_response`]: either a validated structured value,
/// or a rejection that the caller turns into `finishReason=content-filter`
/// plus attached `validationErrors` without throwing.
#[derive(Debug, Clone)]
pub enum ValidatedContent {
    /// No schema was requested; `content` passes through unexamined.
    NotRequested,
    /// Parsed, optionally repaired and unwrapped, and schema-valid.
    Valid { content_text: String, content_object: Value, json_repaired: bool },
    /// Parsed (possibly after repair) but failed schema validation.
    Invalid { content_text: String, content_object: Value, errors: Vec<SchemaValidationError>, finish_reason: FinishReason },
    /// Could not be parsed as JSON at all, even after a repair attempt.
    Unparseable { raw: String },
}

/// `spec.md` §4.9's `validateResponse`: parse, optionally repair,
/// optionally unwrap a single named key, then schema-validate.
pub fn validate_response(raw_content: &str, generation: &GenerationSettings, schema_name: Option<&str>) -> ValidatedContent {
    let Some(response_schema) = &generation.response_schema else {
        return ValidatedContent::NotRequested;
    };

    let json_mode = generation.json_mode.unwrap_or_default();
    let (parsed, json_repaired) = match serde_json::from_str::<Value>(raw_content) {
        Ok(value) => (Some(value), false),
        Err(_) if json_mode != JsonMode::NativeOnly && schema::looks_repairable(raw_content) => {
            (schema::repair_json(raw_content), true)
        }
        Err(_) => (None, false),
    };

    let Some(mut parsed) = parsed else {
        return ValidatedContent::Unparseable { raw: raw_content.to_string() };
    };

    if let Some(name) = schema_name {
        parsed = schema::unwrap_single_named_key(parsed, name);
    }

    match schema::validate(response_schema, &parsed) {
        Ok(()) => ValidatedContent::Valid { content_text: raw_content.to_string(), content_object: parsed, json_repaired },
        Err(errors) => ValidatedContent::Invalid {
            content_text: raw_content.to_string(),
            content_object: parsed,
            errors,
            finish_reason: FinishReason::ContentFilter,
        },
    }
}
