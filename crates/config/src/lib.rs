//! Configuration loading, validation, and management for MiniAGI.
//!
//! Loads configuration from `~/.miniagi/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Providers the router knows how to build.
pub const KNOWN_PROVIDERS: &[&str] = &["ollama", "zai", "openai"];

/// The root configuration structure.
///
/// Maps directly to `~/.miniagi/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion provider settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Orchestration loop settings
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Additional agents registered next to the built-in ones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<AgentConfig>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama", "zai" or "openai"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name; falls back to the provider's default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    #[serde(default = "default_zai_base_url")]
    pub zai_base_url: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// API key for cloud providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_ollama_url() -> String {
    "http://localhost:11434".into()
}
fn default_zai_base_url() -> String {
    "https://api.z.ai/api/coding/paas/v4".into()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_request_timeout() -> u64 {
    60
}

impl LlmConfig {
    /// The configured model, or the provider's default.
    pub fn model_name(&self) -> String {
        if let Some(model) = &self.model {
            return model.clone();
        }
        match self.provider.as_str() {
            "zai" => "glm-4.6".into(),
            "openai" => "gpt-4o-mini".into(),
            _ => "gpt-oss-20b".into(),
        }
    }

    /// The base URL the configured provider talks to.
    pub fn base_url(&self) -> &str {
        match self.provider.as_str() {
            "zai" => &self.zai_base_url,
            "openai" => &self.openai_base_url,
            _ => &self.ollama_url,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            temperature: default_temperature(),
            max_tokens: None,
            ollama_url: default_ollama_url(),
            zai_base_url: default_zai_base_url(),
            openai_base_url: default_openai_base_url(),
            api_key: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("ollama_url", &self.ollama_url)
            .field("zai_base_url", &self.zai_base_url)
            .field("openai_base_url", &self.openai_base_url)
            .field("api_key", &redact(&self.api_key))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Step budget per session
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Agent each session starts with and falls back to
    #[serde(default = "default_entry_agent")]
    pub entry_agent: String,

    /// Bound on a single completion call
    #[serde(default = "default_step_timeout")]
    pub step_timeout_secs: u64,

    /// Optional bound on a whole session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_timeout_secs: Option<u64>,
}

fn default_max_steps() -> u32 {
    10
}
fn default_entry_agent() -> String {
    "orchestrator".into()
}
fn default_step_timeout() -> u64 {
    60
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            entry_agent: default_entry_agent(),
            step_timeout_secs: default_step_timeout(),
            session_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Bound on a single tool invocation
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,

    /// Register `run_python` (only effective with the `code-exec` feature).
    /// Unsafe: runs model-written code with no sandbox.
    #[serde(default)]
    pub enable_code_exec: bool,

    #[serde(default = "default_python")]
    pub python_interpreter: String,

    /// Remote tool servers, keyed by the tool name agents use
    #[serde(default = "default_bridges")]
    pub bridges: BTreeMap<String, BridgeConfig>,
}

fn default_tool_timeout() -> u64 {
    30
}
fn default_python() -> String {
    "python3".into()
}

fn default_bridges() -> BTreeMap<String, BridgeConfig> {
    let mut bridges = BTreeMap::new();
    bridges.insert(
        "mcp_filesystem".into(),
        BridgeConfig {
            url: "http://localhost:8001".into(),
            default_tool: "list_files".into(),
            description: Some("MCP filesystem operations".into()),
            timeout_secs: default_bridge_timeout(),
        },
    );
    bridges.insert(
        "mcp_trader".into(),
        BridgeConfig {
            url: "http://localhost:8002".into(),
            default_tool: "backtest".into(),
            description: Some("MCP trading operations".into()),
            timeout_secs: default_bridge_timeout(),
        },
    );
    bridges
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_tool_timeout(),
            enable_code_exec: false,
            python_interpreter: default_python(),
            bridges: default_bridges(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Base URL; calls go to `<url>/invoke`
    pub url: String,

    /// Remote tool used when the agent does not name one
    pub default_tool: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_bridge_timeout")]
    pub timeout_secs: u64,
}

fn default_bridge_timeout() -> u64 {
    30
}

/// A custom agent persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Role text placed at the top of the preamble
    pub role: String,

    /// Tools the agent may request (empty = every registered tool)
    #[serde(default)]
    pub tools: Vec<String>,

    /// Agents this one may delegate to
    #[serde(default)]
    pub delegates: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.miniagi/config.toml),
    /// then apply environment overrides:
    /// - `LLM_PROVIDER`, `LLM_MODEL`, `LLM_TEMPERATURE`
    /// - `OLLAMA_URL`, `ZAI_API_KEY`, `ZAI_BASE_URL`, `OPENAI_API_KEY`
    /// - `MINIAGI_MAX_STEPS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = provider.trim().to_lowercase();
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(temp) = lookup("LLM_TEMPERATURE") {
            self.llm.temperature = temp.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("LLM_TEMPERATURE is not a number: {temp}"))
            })?;
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.llm.ollama_url = url;
        }
        if let Some(url) = lookup("ZAI_BASE_URL") {
            self.llm.zai_base_url = url;
        }
        if self.llm.api_key.is_none() {
            let key_var = match self.llm.provider.as_str() {
                "openai" => "OPENAI_API_KEY",
                _ => "ZAI_API_KEY",
            };
            self.llm.api_key = lookup(key_var).filter(|k| !k.is_empty());
        }
        if let Some(steps) = lookup("MINIAGI_MAX_STEPS") {
            self.orchestrator.max_steps = steps.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("MINIAGI_MAX_STEPS is not an integer: {steps}"))
            })?;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".miniagi")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !KNOWN_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown LLM provider '{}' (supported: {})",
                self.llm.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.llm.temperature < 0.0 || self.llm.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.orchestrator.max_steps == 0 {
            return Err(ConfigError::ValidationError(
                "orchestrator.max_steps must be at least 1".into(),
            ));
        }

        let timeouts = [
            ("llm.request_timeout_secs", self.llm.request_timeout_secs),
            ("orchestrator.step_timeout_secs", self.orchestrator.step_timeout_secs),
            ("tools.timeout_secs", self.tools.timeout_secs),
            (
                "orchestrator.session_timeout_secs",
                self.orchestrator.session_timeout_secs.unwrap_or(1),
            ),
        ];
        for (key, secs) in timeouts {
            if secs == 0 {
                return Err(ConfigError::ValidationError(format!("{key} must be at least 1")));
            }
        }

        for (name, bridge) in &self.tools.bridges {
            if !bridge.url.starts_with("http://") && !bridge.url.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "tools.bridges.{name}.url must start with http:// or https://"
                )));
            }
            if bridge.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "tools.bridges.{name}.timeout_secs must be at least 1"
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
