//! Error types for the MiniAGI domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

/// Failure of the completion capability.
///
/// A provider never reports failure by returning empty text; every failure
/// mode maps to one of these variants.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response structure: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Remote call to {target} ({tool}) failed: {reason}")]
    Remote {
        target: String,
        tool: String,
        reason: String,
    },
}

impl ToolError {
    /// Render this error as the in-band text an agent reads as tool output.
    ///
    /// Always starts with `ERROR(`; remote failures name the target and the
    /// remote tool instead of the local tool name.
    pub fn render(&self, tool_name: &str) -> String {
        match self {
            Self::Remote { target, tool, reason } => {
                format!("ERROR(mcp:{target},{tool}): {reason}")
            }
            Self::ExecutionFailed { reason, .. } => format!("ERROR({tool_name}): {reason}"),
            Self::Timeout { timeout_secs, .. } => {
                format!("ERROR({tool_name}): timed out after {timeout_secs}s")
            }
            Self::NotFound(name) => format!("ERROR({tool_name}): unknown tool '{name}'"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentRegistryError {
    #[error("Agent '{0}' is already registered")]
    Duplicate(String),

    #[error("Agent '{agent}' delegates to unknown agent '{target}'")]
    UnknownDelegate { agent: String, target: String },

    #[error("Agent '{agent}' lists unknown tool '{tool}'")]
    UnknownTool { agent: String, tool: String },
}

/// Failures that abort an orchestration session.
///
/// Model non-compliance never appears here; it is recovered inside the loop.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("Entry agent '{0}' is not registered")]
    UnknownEntryAgent(String),

    #[error("Completion failed at step {step} (agent '{agent}', provider '{provider}'): {source}")]
    Completion {
        session_id: String,
        step: u32,
        agent: String,
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("Completion timed out at step {step} (agent '{agent}') after {timeout_secs}s")]
    StepTimeout {
        session_id: String,
        step: u32,
        agent: String,
        timeout_secs: u64,
    },

    #[error("Session exceeded {timeout_secs}s after {steps_taken} step(s)")]
    SessionTimeout {
        session_id: String,
        timeout_secs: u64,
        steps_taken: u32,
    },
}

impl OrchestrationError {
    /// The 1-based step at which the session failed, if it failed mid-step.
    pub fn step(&self) -> Option<u32> {
        match self {
            Self::Completion { step, .. } | Self::StepTimeout { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// The agent that was being invoked when the session failed.
    pub fn agent(&self) -> Option<&str> {
        match self {
            Self::Completion { agent, .. } | Self::StepTimeout { agent, .. } => Some(agent),
            _ => None,
        }
    }
}
