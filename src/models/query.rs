//! Request-side types for the natural-language query pipeline.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Prior-turn context carried by the caller. The pipeline keeps no
/// conversational memory of its own beyond what is passed in here.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default)]
    pub previous_query: Option<String>,
    #[serde(default)]
    pub previous_results: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    pub include_response: bool,
    pub include_suggestions: bool,
    #[validate(range(min = 1, max = 50))]
    pub max_results: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { include_response: true, include_suggestions: true, max_results: 10 }
    }
}

/// Pipeline entry request.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[validate(length(min = 1, max = 512, message = "query must be 1..512 characters"))]
    pub query: String,
    pub phone_number: String,
    #[serde(default)]
    pub context: Option<RequestContext>,
    #[serde(default)]
    #[validate(nested)]
    pub options: Option<SearchOptions>,
}

impl SearchRequest {
    pub fn options(&self) -> SearchOptions {
        self.options.clone().unwrap_or_default()
    }

    /// Query text after trimming, the form every downstream stage consumes.
    pub fn trimmed_query(&self) -> &str {
        self.query.trim()
    }
}
