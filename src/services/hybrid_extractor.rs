//! Arbitrates between the regex extractor and the LLM gateway, merging
//! their outputs into a single `HybridExtractionResult`.
//!
//! Never propagates an error to its caller: LLM failures degrade into a
//! `fallbackReason`, they never fail the request.

use std::time::Instant;

use serde::Deserialize;

use crate::models::entities::{ExtractedEntities, TurnoverTier};
use crate::models::intent::Intent;
use crate::models::response::ExtractionMethod;
use crate::models::HybridExtractionResult;
use crate::services::llm::{ChatMessage, LLMGateway};
use crate::services::normalizers::{normalize_branch, normalize_city, normalize_degree, normalize_year};
use crate::services::regex_extractor::{self, RegexExtractionResult};

const SYSTEM_PROMPT: &str = r#"You extract structured entities from a natural-language search query about a community directory.
Return ONLY JSON, no prose, no fences, with exactly this shape (omit fields you cannot find):
{"year": [number], "branch": [string], "degree": string, "location": string, "skills": [string], "services": [string], "name": string, "organizationName": string, "turnoverTier": "low"|"med"|"high"}"#;

const SYSTEM_PROMPT_STRICT: &str = r#"Your previous response was not valid JSON. Reply with nothing except a single JSON object matching exactly:
{"year": [number], "branch": [string], "degree": string, "location": string, "skills": [string], "services": [string], "name": string, "organizationName": string, "turnoverTier": "low"|"med"|"high"}
No markdown fences. No commentary. Omit fields you cannot find."#;

#[derive(Debug, Deserialize, Default)]
struct LlmEntitiesWire {
    #[serde(default)]
    year: Vec<i64>,
    #[serde(default)]
    branch: Vec<String>,
    #[serde(default)]
    degree: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    services: Vec<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    organization_name: Option<String>,
    #[serde(default)]
    turnover_tier: Option<String>,
}

impl LlmEntitiesWire {
    fn into_entities(self) -> ExtractedEntities {
        let mut entities = ExtractedEntities::default();
        for y in self.year {
            entities.graduation_year.insert(y as i32);
        }
        for b in &self.branch {
            if let Some((canonical, tag)) = normalize_branch(b) {
                entities.branch.insert(canonical);
                entities.branch.insert(tag);
            } else {
                entities.branch.insert(b.trim().to_string());
            }
        }
        entities.degree = self.degree.as_deref().and_then(normalize_degree).or(self.degree);
        entities.location = self.location.as_deref().and_then(normalize_city).or(self.location);
        entities.skills = self.skills.into_iter().map(|s| s.trim().to_lowercase()).collect();
        entities.services = self.services.into_iter().map(|s| s.trim().to_lowercase()).collect();
        entities.name = self.name;
        entities.organization_name = self.organization_name;
        entities.turnover_tier = match self.turnover_tier.as_deref() {
            Some("low") => Some(TurnoverTier::Low),
            Some("med") => Some(TurnoverTier::Med),
            Some("high") => Some(TurnoverTier::High),
            _ => None,
        };
        entities
    }
}

/// Structural heuristics beyond the regex extractor's own `needsLLM` flag:
/// multiple independent clauses are a sign the regex pass only captured part
/// of the query.
fn has_multi_clause_structure(query: &str) -> bool {
    query.matches(',').count() >= 2 || query.matches(';').count() >= 1
}

fn decide_use_llm(regex_result: &RegexExtractionResult, intent: Intent, query: &str) -> bool {
    if regex_result.needs_llm {
        return true;
    }
    let year_only_peer_hit = intent == Intent::FindPeers
        && regex_result.matched_patterns.len() == 1
        && regex_result.matched_patterns[0].starts_with("year:");
    if regex_result.confidence < 0.5 && !year_only_peer_hit {
        return true;
    }
    has_multi_clause_structure(query)
}

/// Prefer the regex value for fields it normalizes deterministically
/// (year, degree, location); union everything set-valued.
fn merge_regex_preferred(regex: ExtractedEntities, llm: ExtractedEntities) -> (ExtractedEntities, bool) {
    let mut merged = regex.clone();
    let mut regex_contributed = !regex.is_empty();

    if merged.degree.is_none() {
        merged.degree = llm.degree;
    }
    if merged.location.is_none() {
        merged.location = llm.location;
    }
    if merged.graduation_year.is_empty() {
        merged.graduation_year = llm.graduation_year;
    }
    if merged.name.is_none() {
        merged.name = llm.name;
    }
    if merged.organization_name.is_none() {
        merged.organization_name = llm.organization_name;
    }
    if merged.turnover_tier.is_none() {
        merged.turnover_tier = llm.turnover_tier;
    }

    let before_skills = merged.skills.len();
    let before_services = merged.services.len();
    let before_branch = merged.branch.len();
    merged.skills.extend(llm.skills);
    merged.services.extend(llm.services);
    merged.branch.extend(llm.branch);
    if merged.skills.len() > before_skills
        || merged.services.len() > before_services
        || merged.branch.len() > before_branch
    {
        regex_contributed = true;
    }

    (merged, regex_contributed)
}

pub async fn extract(
    query: &str,
    intent: Intent,
    gateway: Option<&LLMGateway>,
) -> HybridExtractionResult {
    let started = Instant::now();
    let regex_result = regex_extractor::extract(query);

    let wants_llm = decide_use_llm(&regex_result, intent, query);
    let gateway_available = gateway.map(|g| g.has_providers()).unwrap_or(false);

    if !wants_llm {
        return HybridExtractionResult {
            entities: regex_result.entities,
            confidence: regex_result.confidence,
            method: ExtractionMethod::Regex,
            llm_used: false,
            extraction_time_ms: started.elapsed().as_millis() as u64,
            fallback_reason: None,
        };
    }

    if !gateway_available {
        return HybridExtractionResult {
            entities: regex_result.entities,
            confidence: regex_result.confidence.max(0.3),
            method: ExtractionMethod::Regex,
            llm_used: false,
            extraction_time_ms: started.elapsed().as_millis() as u64,
            fallback_reason: Some("llm_unavailable".to_string()),
        };
    }

    let gateway = gateway.expect("gateway_available implies gateway present");
    let llm_entities = match call_llm_for_entities(gateway, query).await {
        Ok(entities) => entities,
        Err(fallback_reason) => {
            return HybridExtractionResult {
                entities: regex_result.entities,
                confidence: regex_result.confidence.max(0.3),
                method: ExtractionMethod::Regex,
                llm_used: false,
                extraction_time_ms: started.elapsed().as_millis() as u64,
                fallback_reason: Some(fallback_reason),
            };
        },
    };

    let (merged, regex_contributed) = merge_regex_preferred(regex_result.entities, llm_entities);
    let method = if regex_contributed { ExtractionMethod::Hybrid } else { ExtractionMethod::Llm };

    let confidence = if merged.is_empty() && intent_is_weak(intent, regex_result.confidence) {
        regex_result.confidence.max(0.3)
    } else {
        regex_result.confidence.max(0.6)
    };

    HybridExtractionResult {
        entities: merged,
        confidence,
        method,
        llm_used: true,
        extraction_time_ms: started.elapsed().as_millis() as u64,
        fallback_reason: None,
    }
}

fn intent_is_weak(_intent: Intent, regex_confidence: f64) -> bool {
    regex_confidence < 0.5
}

async fn call_llm_for_entities(gateway: &LLMGateway, query: &str) -> Result<ExtractedEntities, String> {
    let first = gateway
        .generate(&[ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(query)], 0.0, 512)
        .await
        .map_err(|_| "llm_unavailable".to_string())?;

    if let Ok(wire) = serde_json::from_str::<LlmEntitiesWire>(&first.text) {
        return Ok(wire.into_entities());
    }

    let retry = gateway
        .generate(
            &[ChatMessage::system(SYSTEM_PROMPT_STRICT), ChatMessage::user(query)],
            0.0,
            512,
        )
        .await
        .map_err(|_| "llm_parse_failed".to_string())?;

    serde_json::from_str::<LlmEntitiesWire>(&retry.text)
        .map(LlmEntitiesWire::into_entities)
        .map_err(|_| "llm_parse_failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn regex_only_path_when_confident_and_no_gateway() {
        let result = extract("Find web development companies in Chennai", Intent::FindBusiness, None).await;
        assert_eq!(result.method, ExtractionMethod::Regex);
        assert!(!result.llm_used);
        assert!(result.fallback_reason.is_none());
    }

    #[tokio::test]
    async fn never_panics_on_empty_query() {
        let result = extract("", Intent::FindSpecificPerson, None).await;
        assert_eq!(result.method, ExtractionMethod::Regex);
    }

    #[tokio::test]
    async fn falls_back_to_regex_with_reason_when_no_gateway_configured() {
        let result =
            extract("Who can help with digital transformation?", Intent::FindBusiness, None).await;
        assert_eq!(result.method, ExtractionMethod::Regex);
        assert!(!result.llm_used);
        assert_eq!(result.fallback_reason.as_deref(), Some("llm_unavailable"));
        assert!(result.confidence < 0.8);
    }

    #[tokio::test]
    async fn falls_back_to_regex_with_reason_when_gateway_has_no_providers() {
        let gateway = LLMGateway::new(Vec::new(), 5, std::time::Duration::from_secs(30));
        let result =
            extract("Who can help with digital transformation?", Intent::FindBusiness, Some(&gateway))
                .await;
        assert_eq!(result.method, ExtractionMethod::Regex);
        assert!(!result.llm_used);
        assert_eq!(result.fallback_reason.as_deref(), Some("llm_unavailable"));
    }
}
