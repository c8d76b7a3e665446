//! Tool lifecycle: local registration ([`manager`]), call parsing and
//! single-call execution ([`controller`]), and the multi-turn loop
//! ([`orchestrator`]) described in `spec.md` §4.7.

pub mod controller;
pub mod manager;
pub mod orchestrator;

pub use controller::{parse_tool_calls, process_tool_call, process_tool_calls, strip_inline_markers, ToolExecutionResult, DEFAULT_MAX_ITERATIONS};
pub use manager::ToolsManager;
pub use orchestrator::run as run_tool_loop;
