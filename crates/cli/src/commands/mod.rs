pub mod agents;
pub mod config_cmd;
pub mod doctor;
pub mod run;
pub mod tools;

use std::sync::Arc;
use miniagi_agent::{Orchestrator, registry_from_config};
use miniagi_config::AppConfig;

/// Wire provider, tools and agents from configuration.
pub fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator, Box<dyn std::error::Error>> {
    let provider = miniagi_providers::build_from_config(&config.llm)?;
    let tools = miniagi_tools::default_registry(&config.tools);
    let agents = registry_from_config(config, &tools)?;
    tracing::debug!(
        provider = %config.llm.provider,
        tools = tools.len(),
        agents = agents.len(),
        entry_agent = %config.orchestrator.entry_agent,
        "Orchestrator wired"
    );
    let orchestrator = Orchestrator::from_config(config, provider, Arc::new(tools), Arc::new(agents))?;
    Ok(orchestrator)
}

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}
