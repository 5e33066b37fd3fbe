//! Provider router: builds the configured completion provider.

use std::sync::Arc;
use miniagi_config::LlmConfig;
use miniagi_core::error::ProviderError;
use miniagi_core::provider::Provider;
use serde::Serialize;
use tracing::info;
use crate::ollama::OllamaProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider selected by `[llm] provider`.
pub fn build_from_config(config: &LlmConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let timeout = config.request_timeout_secs;
    let provider: Arc<dyn Provider> = match config.provider.as_str() {
        "ollama" => Arc::new(
            OllamaProvider::new(Some(config.ollama_url.as_str())).with_timeout_secs(timeout),
        ),
        "zai" => Arc::new(
            OpenAiCompatProvider::zai(config.api_key.clone(), Some(config.zai_base_url.as_str()))
                .with_timeout_secs(timeout),
        ),
        "openai" => Arc::new(
            OpenAiCompatProvider::new("openai", &config.openai_base_url, config.api_key.clone())
                .with_timeout_secs(timeout),
        ),
        other => {
            return Err(ProviderError::NotConfigured(format!(
                "Unknown LLM provider '{other}'"
            )));
        }
    };

    info!(
        provider = %config.provider,
        model = %config.model_name(),
        base_url = %config.base_url(),
        "Completion provider configured"
    );
    Ok(provider)
}

/// Provider settings safe to show to a user.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    pub api_key_set: bool,
}

pub fn provider_info(config: &LlmConfig) -> ProviderInfo {
    ProviderInfo {
        provider: config.provider.clone(),
        model: config.model_name(),
        temperature: config.temperature,
        base_url: config.base_url().to_string(),
        api_key_set: config.api_key.is_some(),
    }
}
