//! HTTP client for OpenAI-compatible chat completion APIs.
//!
//! Compatible with OpenAI, Azure OpenAI, DeepSeek, and other
//! OpenAI-compatible endpoints — the gateway only ever asks for raw text
//! back. Output text is returned verbatim; JSON parsing is the caller's
//! responsibility.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::models::{ChatMessage, GenerateOutcome, LLMError, ProviderConfig};

pub struct LLMClient {
    http: Client,
}

impl Default for LLMClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LLMClient {
    pub fn new() -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client");
        Self { http }
    }

    pub async fn chat_completion(
        &self,
        provider: &ProviderConfig,
        api_key: &str,
        messages: &[ChatMessage],
        temperature: f64,
        max_tokens: u32,
    ) -> Result<GenerateOutcome, LLMError> {
        let request = ChatCompletionRequest {
            model: provider.model.clone(),
            messages: messages.iter().map(|m| WireMessage { role: m.role, content: m.content.clone() }).collect(),
            max_tokens: Some(max_tokens),
            temperature: Some(temperature),
        };

        let url = format!("{}/chat/completions", provider.api_base.trim_end_matches('/'));
        let started = Instant::now();

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .timeout(Duration::from_millis(provider.timeout_ms))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout(provider.timeout_ms)
                } else {
                    LLMError::ApiError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(LLMError::RateLimited(retry_after));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
            return Err(LLMError::ApiError(format!("{status}: {body}")));
        }

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|e| LLMError::ParseError(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LLMError::ParseError("empty choices in llm response".to_string()))?;

        Ok(GenerateOutcome {
            text: strip_code_fences(&content),
            provider_used: provider.name.clone(),
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Strips a leading/trailing ``` fence (optionally with a language tag)
/// from LLM output.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches('\n');
    rest.strip_suffix("```").unwrap_or(rest).trim().to_string()
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fenced_json_with_language_tag() {
        let text = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\":1}");
    }

    #[test]
    fn strips_bare_fence() {
        let text = "```\n{\"a\":1}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\":1}");
    }

    #[test]
    fn passes_through_unfenced_text() {
        let text = "{\"a\":1}";
        assert_eq!(strip_code_fences(text), "{\"a\":1}");
    }
}
