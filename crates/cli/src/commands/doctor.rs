//! `miniagi doctor`: diagnose provider health.

use miniagi_providers::provider_info;

use super::load_config;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("MiniAGI Doctor");
    println!("==============\n");

    let config = load_config()?;
    let info = provider_info(&config.llm);
    println!("  Provider:     {}", info.provider);
    println!("  Model:        {}", info.model);
    println!("  Temperature:  {}", info.temperature);
    println!("  Endpoint:     {}", info.base_url);
    println!("  API key:      {}", if info.api_key_set { "set" } else { "not set" });
    println!();

    let mut issues = 0;
    let provider = miniagi_providers::build_from_config(&config.llm)?;
    match provider.health_check().await {
        Ok(true) => println!("  ✅ Provider reachable"),
        Ok(false) => {
            println!("  ❌ Provider answered with an error status");
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Provider check failed: {e}");
            issues += 1;
        }
    }

    match provider.list_models().await {
        Ok(models) if models.contains(&info.model) => println!("  ✅ Model '{}' available", info.model),
        Ok(models) if !models.is_empty() => {
            println!("  ⚠️  Model '{}' not listed ({} models available)", info.model, models.len());
            issues += 1;
        }
        _ => {}
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }
    Ok(())
}
