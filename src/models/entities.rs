//! Entity and intent vocabulary shared by every pipeline stage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Coarse revenue classification used by `find_business` / `find_alumni_business`
/// filtering and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TurnoverTier {
    Low,
    Med,
    High,
}

impl TurnoverTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Med => "med",
            Self::High => "high",
        }
    }
}

/// Typed, normalized output of extraction (regex, LLM, or the merge of both).
///
/// Every string-valued field is expected to already be in canonical form by
/// the time it lands here; extractors are responsible for calling the
/// normalizers before inserting into these sets.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntities {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub graduation_year: BTreeSet<i32>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub branch: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub skills: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub services: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turnover_tier: Option<TurnoverTier>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.graduation_year.is_empty()
            && self.branch.is_empty()
            && self.degree.is_none()
            && self.location.is_none()
            && self.skills.is_empty()
            && self.services.is_empty()
            && self.name.is_none()
            && self.organization_name.is_none()
            && self.turnover_tier.is_none()
    }

    /// Field-level union, preferring `self`'s scalar values and de-duplicating
    /// set-valued fields. Used by the hybrid extractor's merge step —
    /// callers decide which side is "preferred" by choice of receiver.
    pub fn merge_preferring_self(mut self, other: &ExtractedEntities) -> Self {
        if self.degree.is_none() {
            self.degree = other.degree.clone();
        }
        if self.location.is_none() {
            self.location = other.location.clone();
        }
        if self.name.is_none() {
            self.name = other.name.clone();
        }
        if self.organization_name.is_none() {
            self.organization_name = other.organization_name.clone();
        }
        if self.turnover_tier.is_none() {
            self.turnover_tier = other.turnover_tier;
        }
        self.graduation_year.extend(other.graduation_year.iter().copied());
        self.branch.extend(other.branch.iter().cloned());
        self.skills.extend(other.skills.iter().cloned());
        self.services.extend(other.services.iter().cloned());
        self
    }
}
