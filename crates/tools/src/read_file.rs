//! File read tool: return a file's full UTF-8 contents.

use async_trait::async_trait;
use miniagi_core::error::ToolError;
use miniagi_core::tool::{Tool, ToolArgs, arg_str};
use tracing::debug;

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read file content"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to read"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: &ToolArgs) -> Result<String, ToolError> {
        let path = arg_str(arguments, "path");
        debug!(path = %path, "Reading file");

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "read_file".into(),
                reason: format!("{path}: {e}"),
            })
    }
}
