//! Semantic Search Engine: combines SQL-style filtering
//! with vector similarity, fusing keyword and semantic signals.

pub mod embedding_provider;
pub mod filters;
pub mod fusion;
pub mod repository;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::entities::ExtractedEntities;
use crate::models::member::{cosine, Pagination, ScoredMember};
use crate::services::embedding_cache::EmbeddingCache;

pub use embedding_provider::{EmbeddingError, EmbeddingProvider};
pub use filters::SearchFilters;
pub use repository::MemberRepository;

const KEYWORD_CANDIDATE_LIMIT: i64 = 200;
const VECTOR_CANDIDATE_LIMIT: usize = 50;
const MIN_RELAXED_RESULTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("member store unreachable: {0}")]
    StoreUnreachable(#[from] sqlx::Error),
    #[error("cannot search: empty query and no filters")]
    CannotSearch,
}

pub struct SearchOutcome {
    pub members: Vec<ScoredMember>,
    pub pagination: Pagination,
    /// True when the semantic leg was skipped because both the cache and
    /// the embedding provider failed.
    pub degraded: bool,
}

pub struct SearchEngine {
    repository: MemberRepository,
    embedding_cache: Arc<EmbeddingCache>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
}

impl SearchEngine {
    pub fn new(
        repository: MemberRepository,
        embedding_cache: Arc<EmbeddingCache>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self { repository, embedding_cache, embedding_provider }
    }

    pub async fn search(
        &self,
        query: &str,
        entities: &ExtractedEntities,
        max_results: u32,
    ) -> Result<SearchOutcome, SearchError> {
        let mut filters = SearchFilters::from_entities(entities);
        let trimmed_query = query.trim();

        if trimmed_query.is_empty() && filters.is_empty() {
            return Err(SearchError::CannotSearch);
        }

        let (query_embedding, degraded) = self.resolve_query_embedding(trimmed_query).await;

        let limit = max_results.max(1) as i64;
        let mut filtered = self.repository.filtered(&filters, KEYWORD_CANDIDATE_LIMIT).await?;

        while filtered.len() < max_results as usize && filters.relax_next() {
            filtered = self.repository.filtered(&filters, KEYWORD_CANDIDATE_LIMIT).await?;
            if filtered.len() >= MIN_RELAXED_RESULTS {
                break;
            }
        }

        let terms = query_terms(trimmed_query);
        let keyword_hits = self.repository.keyword_search(&terms, KEYWORD_CANDIDATE_LIMIT).await?;
        let keyword_scores: std::collections::HashMap<i64, f64> = keyword_hits.into_iter().collect();

        let vector_scores = if let Some(embedding) = &query_embedding {
            self.vector_candidate_scores(embedding).await?
        } else {
            std::collections::HashMap::new()
        };

        let candidate_ids: BTreeSet<i64> = filtered
            .iter()
            .map(|m| m.id)
            .chain(keyword_scores.keys().copied())
            .chain(vector_scores.keys().copied())
            .collect();

        let mut candidates = if candidate_ids.len() == filtered.len() {
            filtered
        } else {
            let ids: Vec<i64> = candidate_ids.into_iter().collect();
            self.repository.get_by_ids(&ids).await?
        };
        candidates.retain(|m| m.is_active);

        let mut scored: Vec<(f64, usize, i64, ScoredMember)> = candidates
            .into_iter()
            .map(|member| {
                let keyword_score = keyword_scores.get(&member.id).copied().unwrap_or(0.0);
                let semantic_score = vector_scores.get(&member.id).copied().unwrap_or(0.0);
                let matched_fields = matched_fields_for(&member, entities);
                let relevance_score = fusion::fuse(semantic_score, keyword_score, &matched_fields);
                let field_count = matched_fields.len();
                let id = member.id;
                (
                    relevance_score,
                    field_count,
                    id,
                    ScoredMember { member, relevance_score, semantic_score, keyword_score, matched_fields },
                )
            })
            .collect();

        scored.sort_by(|a, b| fusion::compare_for_ranking((a.0, a.1, a.2), (b.0, b.1, b.2)));

        let total_results = scored.len() as u32;
        let page: Vec<ScoredMember> =
            scored.into_iter().take(max_results as usize).map(|(_, _, _, m)| m).collect();
        let pagination = Pagination::first_page(total_results, max_results.max(1));

        Ok(SearchOutcome { members: page, pagination, degraded })
    }

    /// Cache lookup, falling back to the embedding provider on miss. Both
    /// failing is non-fatal: the semantic leg is skipped and the search
    /// falls back to keyword matching alone.
    async fn resolve_query_embedding(&self, query: &str) -> (Option<Vec<f32>>, bool) {
        if query.is_empty() {
            return (None, false);
        }
        if let Some(cached) = self.embedding_cache.get(query) {
            return (Some(cached), false);
        }
        match self.embedding_provider.embed(query).await {
            Ok(vector) => {
                self.embedding_cache.set(query, vector.clone());
                (Some(vector), false)
            },
            Err(err) => {
                tracing::warn!(error = %err, "embedding provider unavailable, falling back to keyword-only search");
                (None, true)
            },
        }
    }

    async fn vector_candidate_scores(
        &self,
        query_embedding: &[f32],
    ) -> Result<std::collections::HashMap<i64, f64>, SearchError> {
        let embeddings = self.repository.embeddings_for_model(self.embedding_provider.model_tag()).await?;
        let mut scored: Vec<(i64, f64)> = embeddings
            .into_iter()
            .map(|(id, vector)| (id, cosine(&vector, query_embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(VECTOR_CANDIDATE_LIMIT);
        Ok(scored.into_iter().collect())
    }
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| t.len() > 2)
        .collect()
}

fn matched_fields_for(
    member: &crate::models::member::MemberRecord,
    entities: &ExtractedEntities,
) -> BTreeSet<String> {
    let mut matched = BTreeSet::new();
    if entities.graduation_year.contains(&member.year) {
        matched.insert("year".to_string());
    }
    if entities.branch.iter().any(|b| b.eq_ignore_ascii_case(&member.branch)) {
        matched.insert("branch".to_string());
    }
    if entities.location.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(&member.city)) {
        matched.insert("city".to_string());
    }
    if entities.services.iter().any(|s| member.services.iter().any(|ms| ms.eq_ignore_ascii_case(s))) {
        matched.insert("services".to_string());
    }
    if entities.skills.iter().any(|s| member.skills.iter().any(|ms| ms.eq_ignore_ascii_case(s))) {
        matched.insert("skills".to_string());
    }
    if entities.name.as_deref().is_some_and(|n| member.name.to_lowercase().contains(&n.to_lowercase())) {
        matched.insert("name".to_string());
    }
    if entities
        .organization_name
        .as_deref()
        .is_some_and(|o| member.organization.to_lowercase().contains(&o.to_lowercase()))
    {
        matched.insert("organization".to_string());
    }
    matched
}
