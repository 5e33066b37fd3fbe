//! The MiniAGI orchestration engine.
//!
//! A session moves a user message through a small team of agents:
//!
//! 1. **Prompt** the current agent with its preamble and the session log
//! 2. **Parse** the raw reply into a decision, tolerating non-compliance
//! 3. **Dispatch**: answer, run a tool, delegate, or recover via the entry agent
//!
//! The loop stops on a `final` action or when the step budget runs out.

pub mod orchestrator;
pub mod parser;
pub mod personas;
pub mod prompt;

#[cfg(test)]
mod test_helpers;

pub use orchestrator::{Orchestrator, SessionOptions, SessionOutcome, SessionReport, DEFAULT_ENTRY_AGENT};
pub use parser::parse;
pub use personas::{AgentSpec, build_registry, builtin_specs, registry_from_config, render_preamble};
pub use prompt::build_messages;
