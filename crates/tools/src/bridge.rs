//! Remote tool bridge: forwards a call to an external tool server.
//!
//! The server exposes `POST <url>/invoke` taking `{"tool": ..., "args": {...}}`
//! and answering with plain text (or JSON, passed through as text).

use async_trait::async_trait;
use miniagi_config::BridgeConfig;
use miniagi_core::error::ToolError;
use miniagi_core::tool::{Tool, ToolArgs, arg_object, arg_str};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

pub struct BridgeTool {
    name: String,
    description: String,
    server_url: String,
    default_tool: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct InvokeRequest<'a> {
    tool: &'a str,
    args: &'a ToolArgs,
}

impl BridgeTool {
    pub fn new(
        name: impl Into<String>,
        server_url: impl Into<String>,
        default_tool: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self {
            name: name.into(),
            description: format!("Remote tool server at {server_url}"),
            server_url,
            default_tool: default_tool.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Build a bridge from its `[tools.bridges.<name>]` entry.
    pub fn from_config(name: &str, config: &BridgeConfig) -> Self {
        let mut bridge = Self::new(
            name,
            &config.url,
            &config.default_tool,
            Duration::from_secs(config.timeout_secs),
        );
        if let Some(description) = &config.description {
            bridge.description = description.clone();
        }
        bridge
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn default_tool(&self) -> &str {
        &self.default_tool
    }

    fn remote_error(&self, tool: &str, reason: String) -> ToolError {
        warn!(bridge = %self.name, tool = %tool, reason = %reason, "Bridge call failed");
        ToolError::Remote {
            target: self.server_url.clone(),
            tool: tool.to_string(),
            reason,
        }
    }
}

#[async_trait]
impl Tool for BridgeTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "tool": {
                    "type": "string",
                    "description": format!("Remote tool name (default: {})", self.default_tool)
                },
                "args": {
                    "type": "object",
                    "description": "Arguments forwarded to the remote tool"
                }
            }
        })
    }

    async fn execute(&self, arguments: &ToolArgs) -> Result<String, ToolError> {
        let mut tool = arg_str(arguments, "tool");
        if tool.is_empty() {
            tool = self.default_tool.clone();
        }
        let args = arg_object(arguments, "args");

        let url = format!("{}/invoke", self.server_url);
        debug!(bridge = %self.name, url = %url, tool = %tool, "Invoking remote tool");

        let response = self
            .client
            .post(&url)
            .json(&InvokeRequest { tool: &tool, args: &args })
            .send()
            .await
            .map_err(|e| self.remote_error(&tool, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.remote_error(&tool, e.to_string()))?;

        if !status.is_success() {
            return Err(self.remote_error(&tool, format!("HTTP {}: {body}", status.as_u16())));
        }
        Ok(body)
    }
}
