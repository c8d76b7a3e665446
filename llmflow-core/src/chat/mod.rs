//! The synchronous counterpart to [`crate::stream`]: [`controller::execute`]
//! plus its content-retry heuristic, per `spec.md` §4.3.

pub mod controller;

pub use controller::{execute, ChatConfig, ChatContentRetryPolicy};
