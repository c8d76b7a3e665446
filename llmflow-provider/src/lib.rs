//! llmflow-provider — the contract between the orchestration engine
//! (`llmflow-core`) and concrete provider adapters (e.g.
//! `llmflow-openai-compatible`).
//!
//! This crate defines the universal envelope that every adapter must
//! produce (`UniversalMessage`, `UniversalChatParams`,
//! `UniversalChatResponse`, `UniversalStreamResponse`) and the `Provider`
//! trait adapters implement. It has no HTTP dependency and does not know how
//! to reach any particular vendor's API — it only describes shapes.
//!
//! # Architecture
//!
//! - [`model`]: `ModelInfo`, capability/characteristic types the selector
//!   and registry operate on.
//! - [`message`]: `UniversalMessage`, `ContentPart`, roles.
//! - [`params`]: `UniversalChatParams`, generation/library settings.
//! - [`response`]: `UniversalChatResponse`, `UniversalStreamResponse`,
//!   `FinishReason`, `ResponseMetadata`.
//! - [`tool`]: `ToolDefinition`, `ToolCall`, `ToolCallChunk`.
//! - [`usage`]: `Usage`, the nested token/cost accounting shape.
//! - [`stream_part`]: `ProviderStreamChunk`, the tagged variant a provider's
//!   raw stream yields before the core's pipeline normalizes it.
//! - [`provider`]: the `Provider` and `LanguageModel` traits themselves.
//! - [`error`]: `ProviderError`, the taxonomy adapters raise.

pub mod error;
pub mod message;
pub mod model;
pub mod params;
pub mod provider;
pub mod response;
pub mod stream_part;
pub mod tool;
pub mod usage;

pub use error::ProviderError;
pub use message::{ContentPart, FileRef, ImageRef, Role, UniversalMessage};
pub use model::{Capabilities, Characteristics, ModelInfo};
pub use params::{GenerationSettings, HistoryMode, JsonMode, LibrarySettings, UniversalChatParams};
pub use provider::{LanguageModel, Provider};
pub use response::{FinishReason, ResponseMetadata, UniversalChatResponse, UniversalStreamResponse};
pub use stream_part::ProviderStreamChunk;
pub use tool::{ToolCall, ToolCallChunk, ToolDefinition};
pub use usage::Usage;
