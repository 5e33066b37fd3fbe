//! File write tool: create or overwrite a file, creating parent directories.

use async_trait::async_trait;
use miniagi_core::error::ToolError;
use miniagi_core::tool::{Tool, ToolArgs, arg_str};
use std::path::Path;
use tracing::debug;

pub struct WriteFileTool;

fn failed(reason: String) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: "write_file".into(),
        reason,
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write to file"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to write to"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, arguments: &ToolArgs) -> Result<String, ToolError> {
        let path = arg_str(arguments, "path");
        let content = arg_str(arguments, "content");

        if let Some(parent) = Path::new(&path).parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| failed(format!("{}: {e}", parent.display())))?;
        }

        tokio::fs::write(&path, &content)
            .await
            .map_err(|e| failed(format!("{path}: {e}")))?;

        let chars = content.chars().count();
        debug!(path = %path, chars, "Wrote file");
        Ok(format!("OK: Wrote {chars} chars to {path}"))
    }
}
