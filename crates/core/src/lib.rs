//! # MiniAGI Core
//!
//! Domain types, traits, and error definitions for the MiniAGI orchestrator.
//! This crate has no HTTP or runtime framework dependencies; it defines the
//! model every other crate implements against.
//!
//! The orchestration loop only ever sees three capabilities:
//! - a [`Provider`] that turns role/content turns into raw text
//! - a [`ToolRegistry`] of named tools that always answer with text
//! - an [`AgentRegistry`] of named instruction preambles

pub mod agent;
pub mod decision;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentDefinition, AgentRegistry};
pub use decision::{Decision, DecisionKind, StepEvent, MAX_STEPS_REACHED, NO_ANSWER};
pub use error::{AgentRegistryError, OrchestrationError, ProviderError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{Tool, ToolArgs, ToolDefinition, ToolOutcome, ToolRegistry};
