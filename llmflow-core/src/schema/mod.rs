//! JSON Schema validation, single-key unwrapping, and best-effort repair
//! of near-valid JSON text, per `spec.md` §4.9's `validateResponse` and
//! §4.7's tool-argument coercion.
//!
//! Grounded on the teacher's former `tool/parse_tool_call.rs`
//! `validate_tool_input` pattern (compile a `jsonschema::Validator`,
//! collect `iter_errors` into a flat list) generalized from tool
//! arguments to both tool arguments and structured chat responses.

mod repair;

pub use repair::{looks_repairable, repair_json};

use serde_json::Value;

use crate::error::SchemaValidationError;

/// Compiles `schema` and validates `value` against it, returning every
/// violation rather than stopping at the first.
pub fn validate(schema: &Value, value: &Value) -> Result<(), Vec<SchemaValidationError>> {
    let validator = match jsonschema::validator_for(schema) {
        Ok(v) => v,
        Err(e) => return Err(vec![SchemaValidationError { path: String::new(), message: e.to_string() }]),
    };

    if validator.is_valid(value) {
        return Ok(());
    }

    let errors: Vec<SchemaValidationError> = validator
        .iter_errors(value)
        .map(|e| SchemaValidationError { path: e.instance_path.to_string(), message: e.to_string() })
        .collect();
    Err(errors)
}

/// If `parsed` is a JSON object with exactly one key matching
/// `schema_name` case-insensitively, unwraps that key's value. Otherwise
/// returns `parsed` unchanged, matching `spec.md` §4.9 step 3.
pub fn unwrap_single_named_key(parsed: Value, schema_name: &str) -> Value {
    if let Value::Object(map) = &parsed {
        if map.len() == 1 {
            if let Some((key, value)) = map.iter().next() {
                if key.eq_ignore_ascii_case(schema_name) {
                    return value.clone();
                }
            }
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_value_passes() {
        let schema = json!({"type": "object", "properties": {"x": {"type": "number"}}, "required": ["x"]});
        assert!(validate(&schema, &json!({"x": 1})).is_ok());
    }

    #[test]
    fn invalid_value_collects_all_errors() {
        let schema = json!({
            "type": "object",
            "properties": {"x": {"type": "number"}, "y": {"type": "string"}},
            "required": ["x", "y"]
        });
        let errors = validate(&schema, &json!({})).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn unwraps_single_matching_key_case_insensitively() {
        let wrapped = json!({"Weather": {"temp": 72}});
        let unwrapped = unwrap_single_named_key(wrapped, "weather");
        assert_eq!(unwrapped, json!({"temp": 72}));
    }

    #[test]
    fn leaves_multi_key_objects_untouched() {
        let value = json!({"a": 1, "b": 2});
        assert_eq!(unwrap_single_named_key(value.clone(), "a"), value);
    }
}
