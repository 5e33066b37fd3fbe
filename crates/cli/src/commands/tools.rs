//! `miniagi tools`: list tool signatures.

use super::load_config;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let tools = miniagi_tools::default_registry(&config.tools);

    println!("Tools (timeout {}s):", config.tools.timeout_secs);
    for def in tools.definitions() {
        println!("  {}", def.signature());
    }
    Ok(())
}
