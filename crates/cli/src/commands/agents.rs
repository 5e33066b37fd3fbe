//! `miniagi agents`: list registered agents.

use miniagi_agent::registry_from_config;

use super::load_config;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let tools = miniagi_tools::default_registry(&config.tools);
    let agents = registry_from_config(&config, &tools)?;

    println!("Agents (entry: {}):", config.orchestrator.entry_agent);
    for name in agents.names() {
        if let Some(agent) = agents.get(name) {
            println!("  {:<14} {}", agent.name, agent.description);
        }
    }
    Ok(())
}
