//! Decisions produced by one agent invocation, and the step records exposed
//! to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::tool::ToolArgs;

/// Answer returned when an agent finishes without any answer text.
pub const NO_ANSWER: &str = "[NO ANSWER]";

/// Answer returned when the step budget runs out before a `final` action.
pub const MAX_STEPS_REACHED: &str = "[MAX STEPS REACHED - No final answer provided]";

/// The structured outcome of one agent invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// The model's stated reasoning (may be empty).
    pub thought: String,
    pub kind: DecisionKind,
}

/// What the agent asked the loop to do next.
///
/// References (`tool`, `target`) are unvalidated model output; the loop
/// checks them against the registries before acting.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionKind {
    Final {
        answer: String,
    },
    UseTool {
        tool: Option<String>,
        args: ToolArgs,
    },
    Delegate {
        target: Option<String>,
        args: ToolArgs,
        answer: String,
    },
    /// An action name outside the contract. `raw` is the backfilled record.
    Unknown {
        action: String,
        raw: Value,
    },
}

impl Decision {
    pub fn final_answer(thought: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            thought: thought.into(),
            kind: DecisionKind::Final {
                answer: answer.into(),
            },
        }
    }

    /// The action name as it appears in the trace.
    pub fn action_name(&self) -> &str {
        match &self.kind {
            DecisionKind::Final { .. } => "final",
            DecisionKind::UseTool { .. } => "use_tool",
            DecisionKind::Delegate { .. } => "delegate",
            DecisionKind::Unknown { action, .. } => action,
        }
    }

    pub fn tool(&self) -> Option<&str> {
        match &self.kind {
            DecisionKind::UseTool { tool, .. } => tool.as_deref(),
            DecisionKind::Unknown { raw, .. } => raw["tool"].as_str(),
            _ => None,
        }
    }

    pub fn target_agent(&self) -> Option<&str> {
        match &self.kind {
            DecisionKind::Delegate { target, .. } => target.as_deref(),
            DecisionKind::Unknown { raw, .. } => raw["target_agent"].as_str(),
            _ => None,
        }
    }

    /// The full six-field record, as replayed into later prompts.
    pub fn to_record(&self) -> Value {
        let (args, answer) = match &self.kind {
            DecisionKind::Final { answer } => (ToolArgs::new(), answer.clone()),
            DecisionKind::UseTool { args, .. } => (args.clone(), String::new()),
            DecisionKind::Delegate { args, answer, .. } => (args.clone(), answer.clone()),
            DecisionKind::Unknown { raw, .. } => return raw.clone(),
        };

        serde_json::json!({
            "thought": self.thought,
            "action": self.action_name(),
            "tool": self.tool(),
            "target_agent": self.target_agent(),
            "args": args,
            "answer": answer,
        })
    }
}

/// One step of an orchestration session, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    /// 1-based step index
    pub step: u32,
    /// Agent that produced the decision
    pub agent: String,
    /// Action kind as declared by the model
    pub action: String,
    pub tool: Option<String>,
    pub target_agent: Option<String>,
    pub thought: String,
}

impl StepEvent {
    pub fn from_decision(step: u32, agent: &str, decision: &Decision) -> Self {
        Self {
            step,
            agent: agent.to_string(),
            action: decision.action_name().to_string(),
            tool: decision.tool().map(String::from),
            target_agent: decision.target_agent().map(String::from),
            thought: decision.thought.clone(),
        }
    }
}
