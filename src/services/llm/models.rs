//! LLM gateway configuration and error taxonomy.

use serde::{Deserialize, Serialize};

/// One configured provider, loaded from `[[llm.providers]]` in config.
/// The API key itself is never stored here — it is read from
/// `api_key_env` at call time so it never round-trips through config
/// snapshots or logs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub name: String,
    pub api_base: String,
    pub model: String,
    pub api_key_env: String,
    pub priority: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_max_concurrency() -> usize {
    4
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }
}

/// Successful call result: raw text (fences stripped), the provider that
/// served it, and observed latency.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub text: String,
    pub provider_used: String,
    pub latency_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("llm api error: {0}")]
    ApiError(String),

    #[error("llm response parsing error: {0}")]
    ParseError(String),

    #[error("llm timeout after {0}ms")]
    Timeout(u64),

    #[error("llm provider rate limited, retry after {0}s")]
    RateLimited(u64),

    #[error("provider busy, in-flight call limit reached")]
    ProviderBusy,

    #[error("no llm provider configured")]
    NoProviderConfigured,

    #[error("all llm providers unavailable")]
    AllProvidersUnavailable,

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl LLMError {
    /// Transient failures are worth another attempt within the same
    /// provider's retry budget: exponential backoff on transient errors
    /// (network, 5xx, 429).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::RateLimited(_) | Self::ApiError(_))
    }
}
