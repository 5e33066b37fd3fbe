//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what give an agent the ability to act: read and write files,
//! run code, or call a remote tool server. A tool may fail internally, but
//! the [`ToolRegistry`] is the boundary where every failure is turned into
//! error-prefixed text, so the orchestration loop only ever sees a `String`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use crate::error::ToolError;

/// Named tool arguments as produced by the model.
pub type ToolArgs = serde_json::Map<String, Value>;

/// A tool definition rendered into agent preambles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: Value,
}

impl ToolDefinition {
    /// One-line signature, e.g. `write_file(path: string, content: string) - Write to file`.
    ///
    /// Required parameters come first in declaration order, optional ones after.
    pub fn signature(&self) -> String {
        let properties = self.parameters["properties"].as_object();
        let mut names: Vec<String> = self.parameters["required"]
            .as_array()
            .map(|req| req.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();
        if let Some(props) = properties {
            for key in props.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let params: Vec<String> = names
            .iter()
            .map(|name| {
                let ty = properties
                    .and_then(|p| p.get(name))
                    .and_then(|p| p["type"].as_str())
                    .unwrap_or("any");
                format!("{name}: {ty}")
            })
            .collect();

        format!("{}({}) - {}", self.name, params.join(", "), self.description)
    }
}

/// The core Tool trait.
///
/// Implementations read their arguments with [`arg_str`], [`arg_i64`] and
/// [`arg_object`], which supply safe defaults for absent keys instead of
/// failing the step.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (shown to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: &ToolArgs) -> std::result::Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for agent preambles.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Read a text argument. Missing or `null` gives `""`; any other non-string
/// value is passed through as its JSON text.
pub fn arg_str(args: &ToolArgs, key: &str) -> String {
    match args.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Read an integer argument. Missing or unparseable gives `0`.
pub fn arg_i64(args: &ToolArgs, key: &str) -> i64 {
    match args.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    }
}

/// Read an object argument. Missing or non-object gives an empty map.
pub fn arg_object(args: &ToolArgs, key: &str) -> ToolArgs {
    match args.get(key) {
        Some(Value::Object(map)) => map.clone(),
        _ => ToolArgs::new(),
    }
}

/// What one registry call produced.
///
/// `success` comes from the tool itself, never from the shape of `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub output: String,
    pub success: bool,
    pub duration_ms: u64,
}

/// A registry of available tools.
///
/// Populated once at startup and then shared read-only behind an `Arc`.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    timeout: Duration,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Bound every invocation by this timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all tool definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name. Never fails: unknown tools, tool errors and
    /// timeouts all come back as `ERROR(...)` text.
    pub async fn invoke(&self, name: &str, arguments: &ToolArgs) -> String {
        self.call(name, arguments).await.output
    }

    /// Like [`invoke`](Self::invoke), also reporting whether the tool succeeded.
    pub async fn call(&self, name: &str, arguments: &ToolArgs) -> ToolOutcome {
        let Some(tool) = self.tools.get(name) else {
            return ToolOutcome {
                output: ToolError::NotFound(name.to_string()).render(name),
                success: false,
                duration_ms: 0,
            };
        };

        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, tool.execute(arguments)).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (output, success) = match result {
            Ok(Ok(output)) => {
                debug!(tool = %name, duration_ms, "Tool executed");
                (output, true)
            }
            Ok(Err(e)) => {
                warn!(tool = %name, duration_ms, error = %e, "Tool execution failed");
                (e.render(name), false)
            }
            Err(_) => {
                let err = ToolError::Timeout {
                    tool_name: name.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                };
                warn!(tool = %name, duration_ms, "Tool timed out");
                (err.render(name), false)
            }
        };

        ToolOutcome {
            output,
            success,
            duration_ms,
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
