//! Member/embedding/search-result types.
//!
//! `MemberRecord` and `EmbeddingVector` are read-only projections of an
//! external store; the row-level `sqlx` mapping that produces
//! them lives in `services::search::repository`, not here.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::entities::TurnoverTier;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub degree: String,
    pub branch: String,
    pub city: String,
    pub organization: String,
    pub designation: String,
    pub skills: Vec<String>,
    pub services: Vec<String>,
    /// Annual turnover in crores of rupees. `ExtractedEntities::turnover_tier`
    /// is a coarse bucket derived from this value by [`turnover_tier_for`],
    /// not stored redundantly on the record itself.
    pub turnover_crores: Option<f64>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub is_active: bool,
}

/// Thresholds mapping a raw turnover figure to the coarse tier used for
/// filtering. Cutoffs are an
/// implementation choice: under 1 crore is `low`, 1-10 crore is `med`,
/// above 10 crore is `high`.
const TURNOVER_LOW_MAX_CRORES: f64 = 1.0;
const TURNOVER_MED_MAX_CRORES: f64 = 10.0;

pub fn turnover_tier_for(turnover_crores: Option<f64>) -> Option<TurnoverTier> {
    let value = turnover_crores?;
    Some(if value < TURNOVER_LOW_MAX_CRORES {
        TurnoverTier::Low
    } else if value < TURNOVER_MED_MAX_CRORES {
        TurnoverTier::Med
    } else {
        TurnoverTier::High
    })
}

/// Renders a crore figure as "₹X.X Cr / L / K" the way the response
/// formatter needs it.
pub fn humanize_turnover(turnover_crores: Option<f64>) -> String {
    let Some(crores) = turnover_crores else {
        return "turnover not disclosed".to_string();
    };
    if crores >= 1.0 {
        format!("₹{crores:.1} Cr")
    } else if crores >= 0.01 {
        format!("₹{:.1} L", crores * 100.0)
    } else {
        format!("₹{:.1} K", crores * 100_000.0)
    }
}

/// A member's profile embedding, dimension fixed for the life of the store
/// — constant across the store.
#[derive(Debug, Clone)]
pub struct EmbeddingVector {
    pub member_id: i64,
    pub model_tag: String,
    pub values: Vec<f32>,
}

impl EmbeddingVector {
    pub fn cosine_similarity(&self, other: &[f32]) -> f64 {
        cosine(&self.values, other)
    }
}

pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// A member plus the scoring breakdown that produced its rank.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMember {
    pub member: MemberRecord,
    pub relevance_score: f64,
    pub semantic_score: f64,
    pub keyword_score: f64,
    pub matched_fields: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub results_per_page: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    pub fn first_page(total_results: u32, results_per_page: u32) -> Self {
        let results_per_page = results_per_page.max(1);
        let total_pages = total_results.div_ceil(results_per_page).max(1);
        Self {
            current_page: 1,
            total_pages,
            total_results,
            results_per_page,
            has_next_page: total_pages > 1,
            has_previous_page: false,
        }
    }
}
