//! Agent definitions and the agent registry.
//!
//! An agent is nothing more than a named instruction preamble; every agent
//! shares the same completion mechanism. The registry is filled at startup
//! and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::error::AgentRegistryError;

/// A named instruction preamble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Registry key (e.g., "orchestrator", "coder")
    pub name: String,

    /// One-line summary shown to agents that may delegate here
    pub description: String,

    /// Full system preamble: role, response contract, tools, delegates
    pub preamble: String,
}

impl AgentDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        preamble: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            preamble: preamble.into(),
        }
    }
}

/// Name → agent definition.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, AgentDefinition>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Names must be unique.
    pub fn register(&mut self, agent: AgentDefinition) -> Result<(), AgentRegistryError> {
        if self.agents.contains_key(&agent.name) {
            return Err(AgentRegistryError::Duplicate(agent.name));
        }
        self.agents.insert(agent.name.clone(), agent);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AgentDefinition> {
        self.agents.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// All agent names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.agents.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
