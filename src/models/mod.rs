pub mod entities;
pub mod intent;
pub mod llm_provider;
pub mod member;
pub mod query;
pub mod response;

pub use entities::{ExtractedEntities, TurnoverTier};
pub use intent::{Intent, IntentResult};
pub use llm_provider::{CircuitState, ProviderHealth};
pub use member::{EmbeddingVector, MemberRecord, Pagination, ScoredMember};
pub use query::{RequestContext, SearchOptions, SearchRequest};
pub use response::{
    ExtractionMethod, IntentMetadata, NlSearchResult, PerformanceBlock, ResponseBlock,
    ResultsBlock, Understanding,
};

/// Output of the hybrid extractor.
#[derive(Debug, Clone)]
pub struct HybridExtractionResult {
    pub entities: ExtractedEntities,
    pub confidence: f64,
    pub method: ExtractionMethod,
    pub llm_used: bool,
    pub extraction_time_ms: u64,
    pub fallback_reason: Option<String>,
}

impl HybridExtractionResult {
    pub fn regex_only(entities: ExtractedEntities, confidence: f64, extraction_time_ms: u64) -> Self {
        Self {
            entities,
            confidence,
            method: ExtractionMethod::Regex,
            llm_used: false,
            extraction_time_ms,
            fallback_reason: None,
        }
    }
}
