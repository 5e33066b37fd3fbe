//! `miniagi run`: answer one message.

use miniagi_agent::SessionOptions;

use super::{build_orchestrator, load_config};

pub async fn run(
    message: String,
    max_steps: Option<u32>,
    instruction: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = build_orchestrator(&config)?;

    let options = SessionOptions {
        max_steps: max_steps.unwrap_or(config.orchestrator.max_steps),
        system_instruction: instruction,
    };

    if !json {
        eprint!("  Thinking...");
    }
    let result = orchestrator.run_with(&message, options).await;
    if !json {
        eprint!("\r              \r");
    }
    let report = result.inspect_err(|e| {
        tracing::error!(step = ?e.step(), agent = ?e.agent(), error = %e, "Session failed");
    })?;
    tracing::debug!(
        session_id = %report.session_id,
        steps = report.steps_taken,
        outcome = report.outcome.as_str(),
        "Session finished"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", report.answer);
    println!();
    println!("  Trace ({} step(s), session {}):", report.steps_taken, report.session_id);
    for event in &report.events {
        let subject = event
            .tool
            .as_deref()
            .or(event.target_agent.as_deref())
            .map(|s| format!(" {s}"))
            .unwrap_or_default();
        println!("    {}. [{}] {}{}", event.step, event.agent, event.action, subject);
        if !event.thought.is_empty() {
            println!("       {}", event.thought);
        }
    }
    Ok(())
}
