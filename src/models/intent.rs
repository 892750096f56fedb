//! Intent vocabulary and classifier output.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    FindBusiness,
    FindPeers,
    FindSpecificPerson,
    FindAlumniBusiness,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FindBusiness => "find_business",
            Self::FindPeers => "find_peers",
            Self::FindSpecificPerson => "find_specific_person",
            Self::FindAlumniBusiness => "find_alumni_business",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the intent classifier, before entities have been merged in.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntentResult {
    pub primary: Intent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Intent>,
    pub confidence: f64,
    pub matched_patterns: Vec<String>,
}

impl IntentResult {
    /// No rule fired: primary defaults to the weakest-commitment intent with
    /// zero confidence.
    pub fn unscored() -> Self {
        Self {
            primary: Intent::FindSpecificPerson,
            secondary: None,
            confidence: 0.0,
            matched_patterns: Vec::new(),
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.secondary.is_some()
    }

    /// Short clarifying prompts offered when the query scored close between
    /// two intents.
    pub fn suggest_refinement(&self) -> Vec<String> {
        let Some(secondary) = self.secondary else {
            return Vec::new();
        };
        vec![
            format!("Looking for {}?", self.primary.as_str().replace('_', " ")),
            format!("Or did you mean {}?", secondary.as_str().replace('_', " ")),
        ]
    }
}
