//! `StreamBuffer`: reassembles tool-call argument deltas spread across
//! many stream chunks into complete calls, by brace/bracket balance.
//!
//! No teacher equivalent (the teacher's streams never carry
//! incrementally-built tool-call arguments); built directly from
//! `spec.md` §4.5's state machine and balance-scanning algorithm.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use llmflow_provider::tool::ToolCall;
use serde_json::Value;

/// How long an unparseable buffered tool call is kept open before being
/// force-completed with its raw text, per `spec.md` §4.5.
pub const FORCE_COMPLETE_TIMEOUT: Duration = Duration::from_millis(10_000);

struct PendingCall {
    name: Option<String>,
    arguments_buffer: String,
    started_at: Instant,
    is_complete: bool,
}

/// What [`StreamBuffer::push_chunk`] yields for one incoming chunk: the
/// content passed through unchanged, plus zero or more tool calls that
/// just became complete (by balance or by timeout).
pub struct BufferedOutput {
    pub content: String,
    pub completed_calls: Vec<ToolCall>,
}

/// Accumulates per-tool-call argument text across chunks, keyed by
/// (provider-given or synthesized) id.
#[derive(Default)]
pub struct StreamBuffer {
    pending: HashMap<String, PendingCall>,
    content: String,
    synthetic_counter: u64,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `content` to the accumulated text and passes it through.
    /// Upserts `id`/`name`/`arguments_chunk` into the matching pending
    /// call, synthesizing an id when the provider didn't supply one.
    /// Returns every call that became complete as a result of this push.
    pub fn push_chunk(&mut self, content: &str, tool_call_delta: Option<(Option<&str>, Option<&str>, Option<&str>)>) -> BufferedOutput {
        self.content.push_str(content);

        let mut completed = Vec::new();

        if let Some((id, name, arguments_chunk)) = tool_call_delta {
            let key = match id {
                Some(id) => id.to_string(),
                None => {
                    self.synthetic_counter += 1;
                    format!("synthetic-{}", self.synthetic_counter)
                }
            };

            let entry = self.pending.entry(key.clone()).or_insert_with(|| PendingCall {
                name: None,
                arguments_buffer: String::new(),
                started_at: Instant::now(),
                is_complete: false,
            });

            if let Some(name) = name {
                entry.name = Some(name.to_string());
            }
            if let Some(chunk) = arguments_chunk {
                entry.arguments_buffer.push_str(chunk);
            }

            if let Some(call) = self.try_complete(&key) {
                completed.push(call);
            }
        }

        completed.extend(self.force_complete_timed_out());

        BufferedOutput { content: content.to_string(), completed_calls: completed }
    }

    fn try_complete(&mut self, key: &str) -> Option<ToolCall> {
        let pending = self.pending.get(key)?;
        if pending.is_complete {
            return None;
        }
        if !is_balanced(&pending.arguments_buffer) {
            return None;
        }
        match serde_json::from_str::<Value>(&pending.arguments_buffer) {
            Ok(arguments) => {
                let pending = self.pending.get_mut(key).unwrap();
                pending.is_complete = true;
                Some(ToolCall { id: Some(key.to_string()), name: pending.name.clone().unwrap_or_default(), arguments })
            }
            Err(_) => None,
        }
    }

    fn force_complete_timed_out(&mut self) -> Vec<ToolCall> {
        let now = Instant::now();
        let expired: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, call)| !call.is_complete && now.duration_since(call.started_at) > FORCE_COMPLETE_TIMEOUT)
            .map(|(key, _)| key.clone())
            .collect();

        let mut completed = Vec::new();
        for key in expired {
            if let Some(pending) = self.pending.get_mut(&key) {
                pending.is_complete = true;
                completed.push(ToolCall {
                    id: Some(key.clone()),
                    name: pending.name.clone().unwrap_or_default(),
                    arguments: Value::String(pending.arguments_buffer.clone()),
                });
            }
        }
        completed
    }

    pub fn accumulated_content(&self) -> &str {
        &self.content
    }
}

/// Counts braces/brackets, ignoring those inside string literals and
/// escaped quotes, and reports whether the buffer is non-empty and
/// balanced — the completion condition `spec.md` §4.5 names.
fn is_balanced(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    let mut depth = 0i64;
    let mut in_string = false;
    let mut escaped = false;
    for ch in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            _ => {}
        }
    }
    depth == 0 && !in_string
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_when_arguments_balance_across_chunks() {
        let mut buffer = StreamBuffer::new();
        let out1 = buffer.push_chunk("", Some((Some("call_1"), Some("get_weather"), Some("{\"city\":"))));
        assert!(out1.completed_calls.is_empty());
        let out2 = buffer.push_chunk("", Some((Some("call_1"), None, Some("\"paris\"}"))));
        assert_eq!(out2.completed_calls.len(), 1);
        assert_eq!(out2.completed_calls[0].name, "get_weather");
        assert_eq!(out2.completed_calls[0].arguments, serde_json::json!({"city": "paris"}));
    }

    #[test]
    fn never_emits_the_same_call_twice() {
        let mut buffer = StreamBuffer::new();
        buffer.push_chunk("", Some((Some("call_1"), Some("f"), Some("{}"))));
        let out2 = buffer.push_chunk("", Some((Some("call_1"), None, Some(""))));
        assert!(out2.completed_calls.is_empty());
    }

    #[test]
    fn synthesizes_an_id_when_provider_omits_one() {
        let mut buffer = StreamBuffer::new();
        let out = buffer.push_chunk("", Some((None, Some("f"), Some("{}"))));
        assert_eq!(out.completed_calls.len(), 1);
        assert!(out.completed_calls[0].id.as_deref().unwrap().starts_with("synthetic-"));
    }

    #[test]
    fn content_passes_through_and_accumulates() {
        let mut buffer = StreamBuffer::new();
        buffer.push_chunk("hello ", None);
        buffer.push_chunk("world", None);
        assert_eq!(buffer.accumulated_content(), "hello world");
    }

    #[test]
    fn braces_inside_strings_do_not_affect_balance() {
        assert!(is_balanced("{\"note\": \"use { and } freely\"}"));
    }
}
