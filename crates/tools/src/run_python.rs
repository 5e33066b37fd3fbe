//! Python execution tool.
//!
//! **Unsafe, development only.** The snippet runs in a plain interpreter
//! process with the caller's privileges: no sandbox, no resource limits.
//! Only compiled with the `code-exec` feature and only registered when
//! `[tools] enable_code_exec = true`.

use async_trait::async_trait;
use miniagi_core::error::ToolError;
use miniagi_core::tool::{Tool, ToolArgs, arg_str};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs the snippet read from stdin in a fresh scope and reports the
/// resulting local bindings.
const DRIVER: &str = r#"
import contextlib, io, sys
_code = sys.stdin.read()
_printed = io.StringIO()
_scope = {}
with contextlib.redirect_stdout(_printed):
    exec(_code, {}, _scope)
sys.stdout.write("EXEC_OK: " + repr(_scope))
if _printed.getvalue():
    sys.stdout.write("\n[stdout]\n" + _printed.getvalue())
"#;

pub struct RunPythonTool {
    interpreter: String,
}

impl RunPythonTool {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for RunPythonTool {
    fn default() -> Self {
        Self::new("python3")
    }
}

fn failed(reason: impl Into<String>) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: "run_python".into(),
        reason: reason.into(),
    }
}

#[async_trait]
impl Tool for RunPythonTool {
    fn name(&self) -> &str {
        "run_python"
    }

    fn description(&self) -> &str {
        "Execute Python code (unsafe, no sandbox)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Python source to execute"
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, arguments: &ToolArgs) -> Result<String, ToolError> {
        let code = arg_str(arguments, "code");
        debug!(interpreter = %self.interpreter, bytes = code.len(), "Executing Python snippet");

        let mut child = Command::new(&self.interpreter)
            .args(["-c", DRIVER])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| failed(format!("failed to start {}: {e}", self.interpreter)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(code.as_bytes())
                .await
                .map_err(|e| failed(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let last_line = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("python exited with an error")
            .trim()
            .to_string();
        warn!(exit_code = output.status.code().unwrap_or(-1), error = %last_line, "Python snippet failed");
        Err(failed(last_line))
    }
}
