//! llmflow-provider-utils — shared HTTP/SSE/encoding plumbing that every
//! provider adapter crate needs but that has nothing to do with any one
//! vendor's API shape.
//!
//! Splitting this out of `llmflow-openai-compatible` (and any adapter
//! crate added later) keeps the SSE buffering loop and the HTTP-error-to-
//! `ProviderError` mapping written once instead of once per adapter.
//!
//! - [`sse`]: byte-stream-to-`SseEvent` framing.
//! - [`data_url`]: base64 and `data:` URL helpers for [`llmflow_provider::message::ImageRef`]/[`llmflow_provider::message::FileRef`].
//! - [`http_error`]: HTTP response to [`llmflow_provider::error::ProviderError`] mapping.

pub mod data_url;
pub mod http_error;
pub mod sse;

pub use data_url::{DataUrlError, build_data_url, decode_base64, encode_base64, parse_data_url};
pub use http_error::{HttpErrorContext, map_http_error};
pub use sse::{SseError, SseEvent, sse_events};
