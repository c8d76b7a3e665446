//! OpenAI-compatible provider adapter: a `llmflow_provider::provider::Provider`
//! implementation over any `/chat/completions`-shaped API (OpenAI, Azure
//! OpenAI, and other compatible services).
//!
//! ```ignore
//! use llmflow_openai_compatible::OpenAICompatibleClient;
//! use llmflow_provider::model::{Capabilities, Characteristics, ModelInfo};
//!
//! let provider = OpenAICompatibleClient::new()
//!     .api_key("your-api-key")
//!     .model(ModelInfo {
//!         name: "gpt-4o-mini".into(),
//!         input_price_per_million: 0.15,
//!         input_cached_price_per_million: None,
//!         output_price_per_million: 0.6,
//!         max_request_tokens: 128_000,
//!         max_response_tokens: 16_384,
//!         tokenization_model: None,
//!         capabilities: Capabilities::default(),
//!         characteristics: Characteristics { quality_index: 70, output_speed: 120.0, first_token_latency: 500.0 },
//!     })
//!     .build();
//! ```

pub mod chat;
pub mod client;
pub mod error;
pub mod language_model;
pub mod provider;

pub use client::OpenAICompatibleClient;
pub use language_model::{OpenAICompatibleLanguageModel, ProviderConfig};
pub use provider::OpenAICompatibleProvider;
