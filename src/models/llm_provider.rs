//! `ProviderHealth` and static provider configuration.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Point-in-time snapshot of a provider's circuit, exposed via
/// `GET /api/llm/status`. The live state lives in atomics inside
/// `services::llm::circuit::CircuitBreaker`; this is a read-only copy.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealth {
    pub name: String,
    pub consecutive_failures: u32,
    pub circuit_state: CircuitState,
    pub opened_at: Option<chrono::DateTime<chrono::Utc>>,
}
