//! `GET /api/llm/status`: per-provider circuit breaker
//! health, read off the gateway's atomics without taking a lock.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::llm_provider::ProviderHealth;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LlmStatusResponse {
    pub providers: Vec<ProviderHealth>,
}

#[utoipa::path(
    get,
    path = "/api/llm/status",
    responses(
        (status = 200, description = "Per-provider circuit breaker health", body = LlmStatusResponse),
    ),
    tag = "llm"
)]
pub async fn status(State(state): State<AppState>) -> Json<LlmStatusResponse> {
    Json(LlmStatusResponse { providers: state.llm_gateway.provider_health_snapshot() })
}
