//! Pipeline response envelope.

use serde::Serialize;
use utoipa::ToSchema;

use super::entities::ExtractedEntities;
use super::intent::Intent;
use super::member::{Pagination, ScoredMember};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntentMetadata {
    pub primary: Intent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Intent>,
    pub intent_confidence: f64,
    pub matched_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Understanding {
    pub intent: Intent,
    pub entities: ExtractedEntities,
    pub confidence: f64,
    pub normalized_query: String,
    pub intent_metadata: IntentMetadata,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultsBlock {
    pub members: Vec<ScoredMember>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBlock {
    pub conversational: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// Mirrors `HybridExtractionResult.method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Regex,
    Llm,
    Hybrid,
    Cached,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceBlock {
    pub extraction_method: ExtractionMethod,
    pub extraction_time_ms: u64,
    pub search_time_ms: u64,
    pub llm_used: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NlSearchResult {
    pub understanding: Understanding,
    pub results: ResultsBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseBlock>,
    pub execution_time_ms: u64,
    pub performance: PerformanceBlock,
    pub degraded: bool,
}
