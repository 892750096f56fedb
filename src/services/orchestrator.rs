//! Top-level pipeline orchestrator: drives a request
//! through intent classification, hybrid extraction, search, formatting
//! and suggestion, attaching per-stage timers and enforcing the soft/hard
//! timeout budget.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::entities::ExtractedEntities;
use crate::models::intent::IntentResult;
use crate::models::member::Pagination;
use crate::models::query::{RequestContext, SearchOptions};
use crate::models::response::{
    ExtractionMethod, IntentMetadata, NlSearchResult, PerformanceBlock, ResponseBlock,
    ResultsBlock, Understanding,
};
use crate::services::llm::LLMGateway;
use crate::services::response_formatter::{self, FormatContext};
use crate::services::search::{SearchEngine, SearchError};
use crate::services::suggestion_engine::{self, SuggestionContext};
use crate::services::{hybrid_extractor, intent_classifier};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("member store unreachable")]
    SearchUnavailable,
}

pub struct Orchestrator {
    gateway: Option<Arc<LLMGateway>>,
    search_engine: Arc<SearchEngine>,
    soft_timeout: Duration,
    hard_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        gateway: Option<Arc<LLMGateway>>,
        search_engine: Arc<SearchEngine>,
        soft_timeout: Duration,
        hard_timeout: Duration,
    ) -> Self {
        Self { gateway, search_engine, soft_timeout, hard_timeout }
    }

    pub async fn process(
        &self,
        query: &str,
        _phone_number: &str,
        _context: Option<&RequestContext>,
        options: &SearchOptions,
    ) -> Result<NlSearchResult, PipelineError> {
        let started = Instant::now();

        match tokio::time::timeout(self.hard_timeout, self.run(query, options, started)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                tracing::warn!(query, "hard timeout breached, returning degraded partial response");
                Ok(self.degraded_empty_result(query, started))
            },
        }
    }

    async fn run(
        &self,
        query: &str,
        options: &SearchOptions,
        started: Instant,
    ) -> Result<NlSearchResult, PipelineError> {
        let trimmed_query = query.trim().to_string();

        let extraction_started = Instant::now();
        let (intent_result, method, entities, llm_used, fallback_reason) =
            self.extract(query, started).await;
        let extraction_time_ms = extraction_started.elapsed().as_millis() as u64;

        let intent_metadata = IntentMetadata {
            primary: intent_result.primary,
            secondary: intent_result.secondary,
            intent_confidence: intent_result.confidence,
            matched_patterns: intent_result.matched_patterns.clone(),
        };

        let no_signal = entities.is_empty() && intent_result.confidence < 0.5;

        let search_started = Instant::now();
        let (members, pagination, degraded) = if no_signal {
            (Vec::new(), Pagination::first_page(0, options.max_results.max(1)), false)
        } else {
            match self.search_engine.search(&trimmed_query, &entities, options.max_results).await {
                Ok(outcome) => (outcome.members, outcome.pagination, outcome.degraded),
                Err(SearchError::CannotSearch) => {
                    (Vec::new(), Pagination::first_page(0, options.max_results.max(1)), false)
                },
                Err(SearchError::StoreUnreachable(err)) => {
                    tracing::error!(error = %err, "member store unreachable, failing request");
                    return Err(PipelineError::SearchUnavailable);
                },
            }
        };
        let search_time_ms = search_started.elapsed().as_millis() as u64;

        let response = if options.include_response {
            let format_ctx = FormatContext {
                query: &trimmed_query,
                intent: intent_result.primary,
                entities: &entities,
                result_count: members.len(),
            };
            let conversational = response_formatter::format(&members, &format_ctx);
            let suggestions = options.include_suggestions.then(|| {
                let suggestion_ctx = SuggestionContext {
                    intent: intent_result.primary,
                    entities: &entities,
                    result_count: members.len(),
                };
                suggestion_engine::suggest(&suggestion_ctx)
            });
            Some(ResponseBlock { conversational, suggestions })
        } else {
            None
        };

        let confidence = intent_result.confidence.max(if entities.is_empty() { 0.0 } else { 0.3 });

        Ok(NlSearchResult {
            understanding: Understanding {
                intent: intent_result.primary,
                entities,
                confidence,
                normalized_query: trimmed_query,
                intent_metadata,
            },
            results: ResultsBlock { members, pagination },
            response,
            execution_time_ms: started.elapsed().as_millis() as u64,
            performance: PerformanceBlock {
                extraction_method: method,
                extraction_time_ms,
                search_time_ms,
                llm_used,
            },
            degraded,
        })
        .map(|mut r: NlSearchResult| {
            if fallback_reason.is_some() {
                r.degraded = true;
            }
            r
        })
    }

    /// Intent classification and regex extraction are independent, so they
    /// run concurrently; the hybrid extractor then arbitrates
    /// between regex and the LLM gateway, respecting the soft timeout.
    async fn extract(
        &self,
        query: &str,
        started: Instant,
    ) -> (IntentResult, ExtractionMethod, ExtractedEntities, bool, Option<String>) {
        let (intent_result, _regex_preview) = tokio::join!(
            async { intent_classifier::classify(query) },
            async { crate::services::regex_extractor::extract(query) },
        );

        let soft_remaining = self.soft_timeout.saturating_sub(started.elapsed());
        let gateway_for_extraction = if soft_remaining.is_zero() {
            tracing::debug!("soft timeout already elapsed, skipping llm fallback");
            None
        } else {
            self.gateway.as_deref()
        };

        let hybrid = match tokio::time::timeout(
            soft_remaining.max(Duration::from_millis(1)),
            hybrid_extractor::extract(query, intent_result.primary, gateway_for_extraction),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => {
                tracing::warn!(query, "soft timeout breached during extraction, falling back to regex");
                hybrid_extractor::extract(query, intent_result.primary, None).await
            },
        };

        (intent_result, hybrid.method, hybrid.entities, hybrid.llm_used, hybrid.fallback_reason)
    }

    fn degraded_empty_result(&self, query: &str, started: Instant) -> NlSearchResult {
        let intent_result = IntentResult::unscored();
        NlSearchResult {
            understanding: Understanding {
                intent: intent_result.primary,
                entities: ExtractedEntities::default(),
                confidence: 0.0,
                normalized_query: query.trim().to_string(),
                intent_metadata: IntentMetadata {
                    primary: intent_result.primary,
                    secondary: None,
                    intent_confidence: 0.0,
                    matched_patterns: Vec::new(),
                },
            },
            results: ResultsBlock { members: Vec::new(), pagination: Pagination::first_page(0, 1) },
            response: None,
            execution_time_ms: started.elapsed().as_millis() as u64,
            performance: PerformanceBlock {
                extraction_method: ExtractionMethod::Regex,
                extraction_time_ms: 0,
                search_time_ms: 0,
                llm_used: false,
            },
            degraded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::services::search::embedding_provider::{EmbeddingError, EmbeddingProvider};
    use crate::services::search::repository::MemberRepository;
    use crate::services::EmbeddingCache;
    use async_trait::async_trait;

    struct NoEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for NoEmbeddings {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::ProviderError("no embedding backend in this test".to_string()))
        }

        fn model_tag(&self) -> &str {
            "test-no-embeddings"
        }

        fn dimension(&self) -> usize {
            8
        }
    }

    async fn orchestrator_without_llm(soft_timeout: Duration, hard_timeout: Duration) -> Orchestrator {
        let pool = db::create_pool("sqlite::memory:").await.expect("create pool");
        db::bootstrap_schema(&pool).await.expect("bootstrap schema");
        let repository = MemberRepository::new(pool);
        let embedding_cache = Arc::new(EmbeddingCache::new(10, Duration::from_secs(60)));
        let embedding_provider: Arc<dyn EmbeddingProvider> = Arc::new(NoEmbeddings);
        let search_engine = Arc::new(SearchEngine::new(repository, embedding_cache, embedding_provider));
        Orchestrator::new(None, search_engine, soft_timeout, hard_timeout)
    }

    #[tokio::test]
    async fn query_with_no_extractable_signal_skips_search_entirely() {
        let orchestrator =
            orchestrator_without_llm(Duration::from_secs(3), Duration::from_secs(10)).await;
        let result = orchestrator
            .process("asdkjhasdkjh qweoiqwe", "+919800000000", None, &SearchOptions::default())
            .await
            .expect("process succeeds");
        assert!(result.results.members.is_empty());
        assert!(!result.degraded);
    }

    #[tokio::test]
    async fn confident_regex_query_completes_without_touching_llm_path() {
        let orchestrator =
            orchestrator_without_llm(Duration::from_secs(3), Duration::from_secs(10)).await;
        let result = orchestrator
            .process("Find 1995 mechanical engineers", "+919800000000", None, &SearchOptions::default())
            .await
            .expect("process succeeds");
        assert_eq!(result.performance.extraction_method, ExtractionMethod::Regex);
        assert!(!result.performance.llm_used);
    }

    #[tokio::test]
    async fn zero_soft_timeout_forces_regex_only_extraction() {
        let orchestrator = orchestrator_without_llm(Duration::ZERO, Duration::from_secs(10)).await;
        let result = orchestrator
            .process(
                "Who can help with digital transformation?",
                "+919800000000",
                None,
                &SearchOptions::default(),
            )
            .await
            .expect("process succeeds");
        assert_eq!(result.performance.extraction_method, ExtractionMethod::Regex);
        assert!(!result.performance.llm_used);
    }

    #[tokio::test]
    async fn degraded_empty_result_carries_the_degraded_flag() {
        // Exercises the hard-timeout fallback payload directly rather than
        // racing a real clock against `tokio::time::timeout`, which would
        // make the test's outcome depend on executor scheduling rather than
        // on this function's own logic.
        let orchestrator =
            orchestrator_without_llm(Duration::from_secs(3), Duration::from_secs(10)).await;
        let result = orchestrator.degraded_empty_result("Find 1995 mechanical engineers", Instant::now());
        assert!(result.degraded);
        assert!(result.results.members.is_empty());
        assert_eq!(result.performance.extraction_method, ExtractionMethod::Regex);
    }
}
