//! `POST /api/search`: runs a natural-language query through
//! the full pipeline and returns the structured result envelope.

use axum::extract::State;
use axum::Json;
use validator::Validate;

use crate::models::query::SearchRequest;
use crate::models::response::NlSearchResult;
use crate::services::PipelineError;
use crate::utils::{ApiError, ApiResult};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Search completed", body = NlSearchResult),
        (status = 400, description = "Invalid request"),
        (status = 503, description = "Search backend unavailable"),
    ),
    tag = "search"
)]
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<NlSearchResult>> {
    request.validate().map_err(|e| ApiError::input_invalid(e.to_string()))?;

    let options = request.options();
    let result = state
        .orchestrator
        .process(request.trimmed_query(), &request.phone_number, request.context.as_ref(), &options)
        .await
        .map_err(|err| match err {
            PipelineError::SearchUnavailable => ApiError::SearchUnavailable,
        })?;

    Ok(Json(result))
}
