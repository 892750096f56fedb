//! Deterministic, pattern-based entity extraction.
//!
//! Every pattern here is a compiled-once static; matching a query never
//! allocates more than the entities it finds, keeping this comfortably
//! under the 20ms budget for queries up to 512 chars.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::entities::{ExtractedEntities, TurnoverTier};
use crate::services::normalizers::{normalize_branch, normalize_city, normalize_degree, normalize_year};

#[derive(Debug, Clone)]
pub struct RegexExtractionResult {
    pub entities: ExtractedEntities,
    pub confidence: f64,
    pub matched_patterns: Vec<String>,
    pub needs_llm: bool,
}

static YEAR_4DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());
static YEAR_2DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{2})\s*(?:passout|batch|pass\s*out)\b").unwrap());

static LOCATION_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:in|at)\s+([A-Za-z][A-Za-z\s]{2,20}?)\b(?:[.,!?]|$| from| for| with)")
        .unwrap()
});
static LOCATION_BASED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([A-Za-z][A-Za-z\s]{2,20}?)-based\b").unwrap());

static NAME_AFTER_TRIGGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i:find|who is|contact for)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)").unwrap()
});
static ORG_AFTER_FROM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:from|at)\s+([A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+){0,3})").unwrap());

const BRANCH_WORDS: &[&str] = &[
    "ece",
    "electronics and communication",
    "cse",
    "comp sci",
    "computer science",
    "mech",
    "mechanical",
    "civil",
    "eee",
    "electrical and electronics",
    "it",
    "information technology",
    "chemical",
    "aero",
    "aeronautical",
];

const DEGREE_WORDS: &[&str] =
    &["b.e", "be", "b.tech", "btech", "m.e", "me", "m.tech", "mtech", "mba", "mca", "bca"];

const SERVICE_LEXICON: &[&str] = &[
    "web development",
    "it consulting",
    "manufacturing",
    "digital transformation",
    "software development",
    "cloud services",
    "it infrastructure",
    "marketing",
    "logistics",
    "real estate",
];

const SKILL_LEXICON: &[&str] =
    &["machine learning", "data science", "cloud computing", "embedded systems", "devops"];

fn word_regex(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).unwrap()
}

static BRANCH_REGEX: Lazy<Regex> = Lazy::new(|| word_regex(BRANCH_WORDS));
static DEGREE_REGEX: Lazy<Regex> = Lazy::new(|| word_regex(DEGREE_WORDS));
static SERVICE_REGEX: Lazy<Regex> = Lazy::new(|| word_regex(SERVICE_LEXICON));
static SKILL_REGEX: Lazy<Regex> = Lazy::new(|| word_regex(SKILL_LEXICON));

static CONNECTIVES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(and|or|but)\b").unwrap());

static TURNOVER_HIGH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:above\s+\d+\s*(?:crore|cr)|high turnover|successful)\b").unwrap()
});
static TURNOVER_LOW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\blow turnover\b").unwrap());
static TURNOVER_MED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:medium|moderate) turnover\b").unwrap());

/// Pattern weight table used for confidence scoring. Values are arbitrary
/// but ordered by how strongly a pattern pins down a single, unambiguous
/// field.
const W_YEAR: f64 = 0.30;
const W_BRANCH: f64 = 0.20;
const W_DEGREE: f64 = 0.10;
const W_LOCATION: f64 = 0.30;
const W_SERVICE: f64 = 0.20;
const W_SKILL: f64 = 0.20;
const W_TURNOVER: f64 = 0.10;
const W_NAME: f64 = 0.15;

pub fn extract(query: &str) -> RegexExtractionResult {
    let mut entities = ExtractedEntities::default();
    let mut matched_patterns = Vec::new();
    let mut weight_sum = 0.0;
    let mut kinds_hit = 0u8;

    if let Some(m) = YEAR_4DIGIT.find(query) {
        if let Some(y) = normalize_year(m.as_str()) {
            entities.graduation_year.insert(y);
            matched_patterns.push("year:4digit".to_string());
            weight_sum += W_YEAR;
            kinds_hit += 1;
        }
    } else if let Some(caps) = YEAR_2DIGIT.captures(query) {
        if let Some(y) = normalize_year(&caps[1]) {
            entities.graduation_year.insert(y);
            matched_patterns.push("year:2digit".to_string());
            weight_sum += W_YEAR;
            kinds_hit += 1;
        }
    }

    let mut branch_hit = false;
    for m in BRANCH_REGEX.find_iter(query) {
        if let Some((canonical, tag)) = normalize_branch(m.as_str()) {
            entities.branch.insert(canonical);
            entities.branch.insert(tag);
            branch_hit = true;
        }
    }
    if branch_hit {
        matched_patterns.push("branch:dictionary".to_string());
        weight_sum += W_BRANCH;
        kinds_hit += 1;
    }

    if let Some(m) = DEGREE_REGEX.find(query) {
        if let Some(canonical) = normalize_degree(m.as_str()) {
            entities.degree = Some(canonical);
            matched_patterns.push("degree:dictionary".to_string());
            weight_sum += W_DEGREE;
            kinds_hit += 1;
        }
    }

    let location_raw = LOCATION_PHRASE
        .captures(query)
        .or_else(|| LOCATION_BASED.captures(query))
        .map(|c| c[1].trim().to_string());
    if let Some(raw) = location_raw {
        if let Some(city) = normalize_city(&raw) {
            entities.location = Some(city);
            matched_patterns.push("location:phrase".to_string());
            weight_sum += W_LOCATION;
            kinds_hit += 1;
        }
    }

    let mut service_hit = false;
    for m in SERVICE_REGEX.find_iter(query) {
        entities.services.insert(m.as_str().to_lowercase());
        service_hit = true;
    }
    if service_hit {
        matched_patterns.push("services:lexicon".to_string());
        weight_sum += W_SERVICE;
        kinds_hit += 1;
    }

    let mut skill_hit = false;
    for m in SKILL_REGEX.find_iter(query) {
        entities.skills.insert(m.as_str().to_lowercase());
        skill_hit = true;
    }
    if skill_hit {
        matched_patterns.push("skills:lexicon".to_string());
        weight_sum += W_SKILL;
        kinds_hit += 1;
    }

    if TURNOVER_HIGH.is_match(query) {
        entities.turnover_tier = Some(TurnoverTier::High);
        matched_patterns.push("turnover:high".to_string());
        weight_sum += W_TURNOVER;
        kinds_hit += 1;
    } else if TURNOVER_MED.is_match(query) {
        entities.turnover_tier = Some(TurnoverTier::Med);
        matched_patterns.push("turnover:med".to_string());
        weight_sum += W_TURNOVER;
        kinds_hit += 1;
    } else if TURNOVER_LOW.is_match(query) {
        entities.turnover_tier = Some(TurnoverTier::Low);
        matched_patterns.push("turnover:low".to_string());
        weight_sum += W_TURNOVER;
        kinds_hit += 1;
    }

    if let Some(caps) = NAME_AFTER_TRIGGER.captures(query) {
        entities.name = Some(caps[1].to_string());
        matched_patterns.push("name:trigger_bigram".to_string());
        weight_sum += W_NAME;
        kinds_hit += 1;
    }
    if let Some(caps) = ORG_AFTER_FROM.captures(query) {
        entities.organization_name = Some(caps[1].to_string());
        matched_patterns.push("organization:trigger_bigram".to_string());
        weight_sum += W_NAME;
        kinds_hit += 1;
    }

    let confidence = weight_sum.min(1.0);
    let has_connective = CONNECTIVES.is_match(query);
    let needs_llm =
        confidence < 0.5 || matched_patterns.is_empty() || (has_connective && kinds_hit >= 2);

    RegexExtractionResult { entities, confidence, matched_patterns, needs_llm }
}

/// Same set of entity kinds counted toward confidence, exposed for the
/// hybrid extractor's arbitration heuristics.
pub fn entity_kind_count(entities: &ExtractedEntities) -> usize {
    let mut set: BTreeSet<&'static str> = BTreeSet::new();
    if !entities.graduation_year.is_empty() {
        set.insert("year");
    }
    if !entities.branch.is_empty() {
        set.insert("branch");
    }
    if entities.degree.is_some() {
        set.insert("degree");
    }
    if entities.location.is_some() {
        set.insert("location");
    }
    if !entities.skills.is_empty() {
        set.insert("skills");
    }
    if !entities.services.is_empty() {
        set.insert("services");
    }
    if entities.turnover_tier.is_some() {
        set.insert("turnover");
    }
    if entities.name.is_some() {
        set.insert("name");
    }
    if entities.organization_name.is_some() {
        set.insert("organization");
    }
    set.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_same_input() {
        let q = "Find 1995 mechanical engineers";
        let a = extract(q);
        let b = extract(q);
        assert_eq!(a.matched_patterns, b.matched_patterns);
        assert_eq!(a.entities, b.entities);
    }

    #[test]
    fn scenario_1995_mechanical_engineers() {
        let r = extract("Find 1995 mechanical engineers");
        assert!(r.entities.graduation_year.contains(&1995));
        assert!(r.entities.branch.contains("Mechanical"));
        assert!(!r.needs_llm || r.confidence >= 0.5);
    }

    #[test]
    fn scenario_web_development_chennai() {
        let r = extract("Find web development companies in Chennai");
        assert_eq!(r.entities.location.as_deref(), Some("Chennai"));
        assert!(r.entities.services.contains("web development"));
    }

    #[test]
    fn scenario_passout_form() {
        let r = extract("Find 95 passout mechanical");
        assert!(r.entities.graduation_year.contains(&1995));
        assert!(r.entities.branch.contains("Mechanical"));
    }

    #[test]
    fn scenario_name_and_organization_trigger_bigrams() {
        let r = extract("Find Sivakumar from USAM Technology");
        assert_eq!(r.entities.name.as_deref(), Some("Sivakumar"));
        assert!(r.entities.organization_name.as_deref().unwrap().contains("USAM"));
    }

    #[test]
    fn empty_query_fires_no_patterns() {
        let r = extract("");
        assert!(r.matched_patterns.is_empty());
        assert_eq!(r.confidence, 0.0);
        assert!(r.needs_llm);
    }
}
