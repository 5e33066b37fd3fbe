//! Built-in tool implementations for MiniAGI.
//!
//! Tools give agents the ability to act: read and write files, call remote
//! tool servers, and (with the `code-exec` feature) run Python snippets.

pub mod bridge;
pub mod read_file;
#[cfg(feature = "code-exec")]
pub mod run_python;
pub mod write_file;

use miniagi_config::ToolsConfig;
use miniagi_core::tool::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;

pub use bridge::BridgeTool;
pub use read_file::ReadFileTool;
#[cfg(feature = "code-exec")]
pub use run_python::RunPythonTool;
pub use write_file::WriteFileTool;

/// Create the tool registry described by `[tools]`.
///
/// `run_python` is registered only when the crate is built with
/// `code-exec` *and* the config enables it.
pub fn default_registry(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new().with_timeout(Duration::from_secs(config.timeout_secs));
    registry.register(Arc::new(ReadFileTool));
    registry.register(Arc::new(WriteFileTool));

    if config.enable_code_exec {
        register_code_exec(&mut registry, config);
    }

    for (name, bridge) in &config.bridges {
        registry.register(Arc::new(BridgeTool::from_config(name, bridge)));
    }

    tracing::debug!(tools = ?registry.names(), "Tool registry built");
    registry
}

#[cfg(feature = "code-exec")]
fn register_code_exec(registry: &mut ToolRegistry, config: &ToolsConfig) {
    tracing::warn!("run_python is enabled: agents can execute arbitrary code");
    registry.register(Arc::new(RunPythonTool::new(&config.python_interpreter)));
}

#[cfg(not(feature = "code-exec"))]
fn register_code_exec(_registry: &mut ToolRegistry, _config: &ToolsConfig) {
    tracing::warn!("enable_code_exec is set but this build lacks the code-exec feature");
}
