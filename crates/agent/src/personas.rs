//! Agent personas and preamble rendering.
//!
//! A persona is a role description plus the tools it may request and the
//! agents it may hand work to. Rendering turns it into the instruction
//! preamble stored in the [`AgentRegistry`].

use miniagi_config::{AgentConfig, AppConfig};
use miniagi_core::agent::{AgentDefinition, AgentRegistry};
use miniagi_core::error::AgentRegistryError;
use miniagi_core::tool::{ToolDefinition, ToolRegistry};
use std::fmt::Write;
use tracing::debug;

/// Tools that may legitimately be missing from a registry (feature-gated).
/// Personas listing them simply do not see them.
const OPTIONAL_TOOLS: &[&str] = &["run_python"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub name: String,
    pub description: String,
    pub role: String,
    /// Tools this agent may request. Empty means every registered tool.
    pub tools: Vec<String>,
    pub delegates: Vec<String>,
}

impl AgentSpec {
    pub fn new(name: &str, description: &str, role: &str) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            role: role.into(),
            tools: Vec::new(),
            delegates: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: &[&str]) -> Self {
        self.tools = tools.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_delegates(mut self, delegates: &[&str]) -> Self {
        self.delegates = delegates.iter().map(|d| d.to_string()).collect();
        self
    }
}

impl From<&AgentConfig> for AgentSpec {
    fn from(config: &AgentConfig) -> Self {
        Self {
            name: config.name.clone(),
            description: config.description.clone(),
            role: config.role.clone(),
            tools: config.tools.clone(),
            delegates: config.delegates.clone(),
        }
    }
}

/// The built-in personas: an entry orchestrator and two specialists.
pub fn builtin_specs() -> Vec<AgentSpec> {
    vec![
        AgentSpec::new(
            "orchestrator",
            "Coordinates the task and delegates to specialists",
            "You are OrchestratorAgent, the coordinator of a small team of agents. \
             Understand the user's goal, gather what you need with tools, delegate \
             coding or research work to the right specialist, and give the user a \
             complete final answer.",
        )
        .with_delegates(&["coder", "researcher"]),
        AgentSpec::new(
            "coder",
            "Python, Node.js, Next.js and trading code expert",
            "You are CoderAgent, an expert programmer in Python, Node.js and Next.js \
             with experience writing trading strategies and backtests. Write complete, \
             working code and save it to files when asked.",
        )
        .with_tools(&["read_file", "write_file", "run_python"]),
        AgentSpec::new(
            "researcher",
            "Analysis and summarisation",
            "You are ResearcherAgent. You analyse material, compare options and write \
             clear, well-structured summaries.",
        )
        .with_tools(&["read_file", "run_python"]),
    ]
}

/// Render the instruction preamble for one persona.
pub fn render_preamble(spec: &AgentSpec, tools: &[ToolDefinition], catalog: &[AgentSpec]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", spec.role.trim());
    out.push_str(
        "\nRespond with exactly one JSON object and no other text:\n\
         {\n  \"thought\": \"your reasoning\",\n  \"action\": \"use_tool\" | \"delegate\" | \"final\",\n  \
         \"tool\": \"tool name or null\",\n  \"target_agent\": \"agent name or null\",\n  \
         \"args\": {},\n  \"answer\": \"final answer or empty\"\n}\n",
    );

    out.push_str("\nAvailable tools:\n");
    if tools.is_empty() {
        out.push_str("(none)\n");
    }
    for tool in tools {
        let _ = writeln!(out, "- {}", tool.signature());
    }

    let delegates: Vec<&AgentSpec> = spec
        .delegates
        .iter()
        .filter_map(|name| catalog.iter().find(|s| &s.name == name))
        .collect();
    if !delegates.is_empty() {
        out.push_str("\nAgents you can delegate to:\n");
        for agent in &delegates {
            let _ = writeln!(out, "- {}: {}", agent.name, agent.description);
        }
    }

    out.push_str("\nActions:\n");
    out.push_str("- use_tool: set \"tool\" and put the tool arguments in \"args\". The tool output is sent back to you.\n");
    if delegates.is_empty() {
        out.push_str("- delegate: not available to you. Prefer \"final\" once you can answer.\n");
    } else {
        out.push_str("- delegate: set \"target_agent\" and describe the work in \"args\": {\"task\": \"...\"}.\n");
    }
    out.push_str("- final: put the complete answer for the user in \"answer\".\n");
    out
}

/// Tool definitions a persona may see.
fn visible_tools(spec: &AgentSpec, registry: &ToolRegistry) -> Result<Vec<ToolDefinition>, AgentRegistryError> {
    if spec.tools.is_empty() {
        return Ok(registry.definitions());
    }

    let mut defs = Vec::with_capacity(spec.tools.len());
    for name in &spec.tools {
        match registry.get(name) {
            Some(tool) => defs.push(tool.to_definition()),
            None if OPTIONAL_TOOLS.contains(&name.as_str()) => {
                debug!(agent = %spec.name, tool = %name, "Tool not registered, hiding it from agent");
            }
            None => {
                return Err(AgentRegistryError::UnknownTool {
                    agent: spec.name.clone(),
                    tool: name.clone(),
                });
            }
        }
    }
    Ok(defs)
}

/// Render every spec and register it, checking cross references.
pub fn build_registry(specs: &[AgentSpec], tools: &ToolRegistry) -> Result<AgentRegistry, AgentRegistryError> {
    let mut registry = AgentRegistry::new();
    for spec in specs {
        if let Some(target) = spec
            .delegates
            .iter()
            .find(|d| !specs.iter().any(|s| &s.name == *d))
        {
            return Err(AgentRegistryError::UnknownDelegate {
                agent: spec.name.clone(),
                target: target.clone(),
            });
        }

        let defs = visible_tools(spec, tools)?;
        let preamble = render_preamble(spec, &defs, specs);
        registry.register(AgentDefinition::new(&spec.name, &spec.description, preamble))?;
    }
    debug!(agents = ?registry.names(), "Agent registry built");
    Ok(registry)
}

/// Built-in personas plus any `[[agents]]` from configuration.
pub fn registry_from_config(config: &AppConfig, tools: &ToolRegistry) -> Result<AgentRegistry, AgentRegistryError> {
    let mut specs = builtin_specs();
    specs.extend(config.agents.iter().map(AgentSpec::from));
    build_registry(&specs, tools)
}
