//! Shared test helpers for orchestration tests.

use async_trait::async_trait;
use miniagi_core::error::{ProviderError, ToolError};
use miniagi_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use miniagi_core::tool::{Tool, ToolArgs, ToolRegistry};
use miniagi_tools::{ReadFileTool, WriteFileTool};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Returns scripted raw replies in order and records every request.
///
/// Panics if more calls are made than replies provided.
pub struct ScriptedProvider {
    replies: Vec<String>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        let Some(reply) = self.replies.get(index) else {
            panic!(
                "ScriptedProvider: no more replies (call #{}, have {})",
                index + 1,
                self.replies.len()
            );
        };
        requests.push(request);
        Ok(text_response(reply))
    }
}

/// Returns the same reply forever.
pub struct RepeatingProvider {
    reply: String,
    calls: Mutex<usize>,
}

impl RepeatingProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Provider for RepeatingProvider {
    fn name(&self) -> &str {
        "repeating_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        Ok(text_response(&self.reply))
    }
}

/// Answers `final` with the user turn echoed back.
pub struct EchoQueryProvider;

#[async_trait]
impl Provider for EchoQueryProvider {
    fn name(&self) -> &str {
        "echo_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::task::yield_now().await;
        let query = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let reply = serde_json::json!({"action": "final", "answer": format!("echo: {query}")});
        Ok(text_response(&reply.to_string()))
    }
}

pub struct FailingProvider {
    error: ProviderError,
}

impl FailingProvider {
    pub fn new(error: ProviderError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(self.error.clone())
    }
}

/// Never answers within any reasonable timeout.
pub struct SlowProvider;

#[async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(text_response(r#"{"action":"final","answer":"too late"}"#))
    }
}

pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: text.to_string(),
        model: "mock-model".into(),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
    }
}

/// A tool with a fixed name that echoes its arguments.
pub struct StubTool {
    name: String,
    description: String,
}

impl StubTool {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "code": { "type": "string" } },
            "required": ["code"]
        })
    }

    async fn execute(&self, arguments: &ToolArgs) -> Result<String, ToolError> {
        Ok(serde_json::Value::Object(arguments.clone()).to_string())
    }
}

/// File tools only; no network bridges.
pub fn tool_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ReadFileTool));
    registry.register(Arc::new(WriteFileTool));
    registry
}
