//! Multi-provider LLM gateway: priority ordering, retry, circuit breaking,
//! and bounded per-provider concurrency.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Semaphore;
use tokio::time::timeout as tokio_timeout;

use crate::models::llm_provider::{CircuitState, ProviderHealth};

use super::circuit::CircuitBreaker;
use super::client::LLMClient;
use super::models::{ChatMessage, GenerateOutcome, LLMError, ProviderConfig};

const PROVIDER_BUSY_WAIT: Duration = Duration::from_millis(500);

pub struct LLMGateway {
    providers: Vec<ProviderConfig>,
    circuits: DashMap<String, Arc<CircuitBreaker>>,
    semaphores: DashMap<String, Arc<Semaphore>>,
    client: LLMClient,
    wall_clock_anchor: (Instant, DateTime<Utc>),
}

impl LLMGateway {
    pub fn new(mut providers: Vec<ProviderConfig>, circuit_threshold: u32, circuit_cooldown: Duration) -> Self {
        providers.sort_by_key(|p| p.priority);
        let circuits = DashMap::new();
        let semaphores = DashMap::new();
        for p in &providers {
            circuits.insert(p.name.clone(), Arc::new(CircuitBreaker::new(circuit_threshold, circuit_cooldown)));
            semaphores.insert(p.name.clone(), Arc::new(Semaphore::new(p.max_concurrency)));
        }
        Self {
            providers,
            circuits,
            semaphores,
            client: LLMClient::new(),
            wall_clock_anchor: (Instant::now(), Utc::now()),
        }
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Attempts providers in priority order, skipping open circuits, until
    /// one succeeds or all are exhausted.
    pub async fn generate(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        max_tokens: u32,
    ) -> Result<GenerateOutcome, LLMError> {
        if self.providers.is_empty() {
            return Err(LLMError::NoProviderConfigured);
        }

        let mut last_err = LLMError::AllProvidersUnavailable;
        for provider in &self.providers {
            let circuit = self.circuits.get(&provider.name).unwrap().clone();
            if !circuit.allow_call() {
                tracing::debug!(provider = %provider.name, "skipping provider, circuit open");
                continue;
            }

            let Ok(api_key) = std::env::var(&provider.api_key_env) else {
                tracing::warn!(provider = %provider.name, "no api key in env, skipping");
                circuit.release_probe();
                continue;
            };

            let permit = {
                let sem = self.semaphores.get(&provider.name).unwrap().clone();
                match tokio_timeout(PROVIDER_BUSY_WAIT, sem.acquire_owned()).await {
                    Ok(Ok(permit)) => permit,
                    _ => {
                        tracing::warn!(provider = %provider.name, "provider busy, queue full");
                        last_err = LLMError::ProviderBusy;
                        circuit.release_probe();
                        continue;
                    },
                }
            };

            match self.call_with_retry(provider, &api_key, messages, temperature, max_tokens).await {
                Ok(outcome) => {
                    circuit.record_success();
                    drop(permit);
                    return Ok(outcome);
                },
                Err(err) => {
                    circuit.record_failure();
                    tracing::warn!(provider = %provider.name, error = %err, "provider call failed");
                    last_err = err;
                    drop(permit);
                },
            }
        }

        Err(if matches!(last_err, LLMError::AllProvidersUnavailable | LLMError::ProviderBusy) {
            LLMError::AllProvidersUnavailable
        } else {
            last_err
        })
    }

    async fn call_with_retry(
        &self,
        provider: &ProviderConfig,
        api_key: &str,
        messages: &[ChatMessage],
        temperature: f64,
        max_tokens: u32,
    ) -> Result<GenerateOutcome, LLMError> {
        let mut attempt = 0u32;
        loop {
            let result = self.client.chat_completion(provider, api_key, messages, temperature, max_tokens).await;
            match result {
                Ok(outcome) => return Ok(outcome),
                Err(err) if err.is_transient() && attempt < provider.max_retries => {
                    let backoff = Duration::from_millis(50 * 2u64.pow(attempt));
                    tracing::debug!(provider = %provider.name, attempt, ?backoff, "retrying after transient error");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                },
                Err(err) => return Err(err),
            }
        }
    }

    pub fn provider_health_snapshot(&self) -> Vec<ProviderHealth> {
        self.providers
            .iter()
            .map(|p| {
                let circuit = self.circuits.get(&p.name).unwrap();
                let state = match circuit.state() {
                    CircuitState::Closed => CircuitState::Closed,
                    CircuitState::Open => CircuitState::Open,
                    CircuitState::HalfOpen => CircuitState::HalfOpen,
                };
                let opened_at = circuit.opened_at().map(|instant| {
                    let (anchor_instant, anchor_wall) = self.wall_clock_anchor;
                    anchor_wall + chrono::Duration::from_std(instant.saturating_duration_since(anchor_instant)).unwrap_or_default()
                });
                ProviderHealth {
                    name: p.name.clone(),
                    consecutive_failures: circuit.failure_count(),
                    circuit_state: state,
                    opened_at,
                }
            })
            .collect()
    }

    #[cfg(test)]
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, priority: u32) -> ProviderConfig {
        ProviderConfig {
            name: name.to_string(),
            api_base: "http://localhost:0".to_string(),
            model: "test-model".to_string(),
            api_key_env: format!("{}_TEST_API_KEY_UNSET", name.to_uppercase()),
            priority,
            timeout_ms: 50,
            max_retries: 0,
            max_concurrency: 2,
        }
    }

    #[test]
    fn providers_are_ordered_by_priority() {
        let gateway = LLMGateway::new(vec![provider("b", 2), provider("a", 1)], 5, Duration::from_secs(30));
        assert_eq!(gateway.provider_names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn no_providers_configured_fails_fast() {
        let gateway = LLMGateway::new(vec![], 5, Duration::from_secs(30));
        let err = gateway.generate(&[ChatMessage::user("hi")], 0.0, 16).await.unwrap_err();
        assert!(matches!(err, LLMError::NoProviderConfigured));
    }

    #[tokio::test]
    async fn missing_api_key_env_skips_provider() {
        let gateway = LLMGateway::new(vec![provider("a", 1)], 5, Duration::from_secs(30));
        let err = gateway.generate(&[ChatMessage::user("hi")], 0.0, 16).await.unwrap_err();
        assert!(matches!(err, LLMError::AllProvidersUnavailable));
    }
}
