//! `UniversalMessage` and its content parts.
//!
//! Grounded on `ai-sdk-provider/src/language_model/prompt/message.rs`'s
//! per-role message enum and `.../content/*.rs`'s tagged content parts,
//! reshaped to the single `{role, content, name?, toolCallId?, toolCalls?}`
//! envelope `spec.md` §3 names instead of the teacher's per-role structs.

use serde::{Deserialize, Serialize};

use crate::tool::ToolCall;

/// The role a [`UniversalMessage`] was authored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    Function,
}

/// Either plain text or an ordered sequence of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Content {
    pub fn is_empty(&self) -> bool {
        match self {
            Content::Text(s) => s.is_empty(),
            Content::Parts(p) => p.is_empty(),
        }
    }

    /// Concatenates the text-bearing parts of this content into one string,
    /// ignoring image/file parts. Used by the token calculator and by the
    /// data splitter, which only ever chunk the text surface of a message.
    pub fn as_text(&self) -> String {
        match self {
            Content::Text(s) => s.clone(),
            Content::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text(t) => Some(t.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

/// A single part of a structured-content message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentPart {
    Text(String),
    Image(ImageRef),
    File(FileRef),
}

/// A reference to image data, either remote (`url`) or inline (`data`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub url: Option<String>,
    pub data: Option<Vec<u8>>,
    pub mime_type: Option<String>,
}

/// A reference to an arbitrary file attachment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub url: Option<String>,
    pub data: Option<Vec<u8>>,
    pub mime_type: Option<String>,
    pub filename: Option<String>,
}

/// One message in a conversation, as passed to and stored by the history
/// manager and sent to providers.
///
/// # Invariant
///
/// A message must carry a non-empty `content` or a non-empty `tool_calls`
/// list; a `Role::Function` message must carry a `name`. Both are enforced
/// by [`UniversalMessage::validate`], which every constructor path in
/// `llmflow-core` calls before a message is accepted into history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversalMessage {
    pub role: Role,
    pub content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// Error returned by [`UniversalMessage::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageValidationError {
    #[error("message must carry non-empty content or a non-empty tool_calls list")]
    EmptyContentAndToolCalls,
    #[error("function-role messages must carry a name")]
    FunctionMessageMissingName,
}

impl UniversalMessage {
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Content::Text(content.into()),
            name: None,
            tool_call_id: None,
            tool_calls: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    pub fn tool_result(tool_call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Content::Text(content.into()),
            name: Some(name.into()),
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: None,
        }
    }

    pub fn with_tool_calls(mut self, calls: Vec<ToolCall>) -> Self {
        self.tool_calls = Some(calls);
        self
    }

    /// Checks the invariant from the struct's doc comment.
    pub fn validate(&self) -> Result<(), MessageValidationError> {
        let has_content = !self.content.is_empty();
        let has_tool_calls = self.tool_calls.as_ref().is_some_and(|c| !c.is_empty());
        if !has_content && !has_tool_calls {
            return Err(MessageValidationError::EmptyContentAndToolCalls);
        }
        if matches!(self.role, Role::Function) && self.name.is_none() {
            return Err(MessageValidationError::FunctionMessageMissingName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_round_trips_as_text_content() {
        let msg = UniversalMessage::user("hello");
        assert_eq!(msg.content.as_text(), "hello");
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn empty_message_without_tool_calls_fails_validation() {
        let msg = UniversalMessage::text(Role::Assistant, "");
        assert_eq!(
            msg.validate(),
            Err(MessageValidationError::EmptyContentAndToolCalls)
        );
    }

    #[test]
    fn empty_content_with_tool_calls_is_valid() {
        let msg = UniversalMessage::text(Role::Assistant, "").with_tool_calls(vec![ToolCall {
            id: Some("call_1".into()),
            name: "get_time".into(),
            arguments: serde_json::json!({}),
        }]);
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn function_message_requires_name() {
        let msg = UniversalMessage::text(Role::Function, "result");
        assert_eq!(
            msg.validate(),
            Err(MessageValidationError::FunctionMessageMissingName)
        );
    }

    #[test]
    fn structured_content_joins_text_parts_only() {
        let msg = UniversalMessage {
            role: Role::User,
            content: Content::Parts(vec![
                ContentPart::Text("see: ".into()),
                ContentPart::Image(ImageRef {
                    url: Some("https://example.com/a.png".into()),
                    ..Default::default()
                }),
                ContentPart::Text("this image".into()),
            ]),
            name: None,
            tool_call_id: None,
            tool_calls: None,
        };
        assert_eq!(msg.content.as_text(), "see: this image");
    }
}
