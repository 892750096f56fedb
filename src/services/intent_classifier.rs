//! Scores a query against the four known intents.
//!
//! Pure and stateless: rule weights are compiled-in constants, no I/O.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::intent::{Intent, IntentResult};

static BUSINESS_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(companies|company|services|service|industry|business|vendor|supplier)\b")
        .unwrap()
});
static PEER_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(batch|batchmates|classmates|alumni from|passout|pass out|year of)\b")
        .unwrap()
});
static PERSON_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(who is|contact of|contact for|find\s+[A-Z])\b").unwrap());

/// A bare 4-digit graduation year (e.g. "1995") is itself a peer-search
/// signal even without an accompanying word like "batch".
static YEAR_SIGNAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

fn business_signal(q: &str) -> f64 {
    BUSINESS_WORDS.find_iter(q).count() as f64
}

/// Lexical peer-language matches only; kept separate from the bare-year
/// signal so the business/peer co-occurrence ratio in `classify` isn't
/// skewed by a year that carries no peer wording of its own.
fn peer_signal(q: &str) -> f64 {
    PEER_WORDS.find_iter(q).count() as f64
}

fn year_signal(q: &str) -> f64 {
    if YEAR_SIGNAL.is_match(q) {
        1.0
    } else {
        0.0
    }
}

fn person_signal(q: &str) -> f64 {
    PERSON_WORDS.find_iter(q).count() as f64
}

fn softmax_confidence(scores: &[(Intent, f64)], top_index: usize) -> f64 {
    let max = scores.iter().map(|(_, s)| *s).fold(f64::MIN, f64::max);
    let exps: Vec<f64> = scores.iter().map(|(_, s)| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    (exps[top_index] / total).clamp(0.0, 1.0)
}

pub fn classify(query: &str) -> IntentResult {
    if query.trim().is_empty() {
        return IntentResult::unscored();
    }

    let business = business_signal(query) * 1.0;
    let peer_lexical = peer_signal(query) * 1.0;
    let peer = peer_lexical + year_signal(query);
    let person = person_signal(query) * 1.2;

    let mut matched_patterns = Vec::new();
    if business > 0.0 {
        matched_patterns.push("business_keywords".to_string());
    }
    if peer_lexical > 0.0 {
        matched_patterns.push("peer_keywords".to_string());
    }
    if peer > peer_lexical {
        matched_patterns.push("peer_year".to_string());
    }
    if person > 0.0 {
        matched_patterns.push("person_keywords".to_string());
    }

    let mut scores = vec![
        (Intent::FindBusiness, business),
        (Intent::FindPeers, peer),
        (Intent::FindSpecificPerson, person),
        (Intent::FindAlumniBusiness, 0.0),
    ];

    // Co-occurrence bias: when both a peer and a business signal fire,
    // prefer find_alumni_business unless one signal dominates the other.
    // Uses the lexical peer signal only, so a bare graduation year riding
    // alongside business language doesn't pull this bias in on its own.
    if peer_lexical > 0.0 && business > 0.0 {
        let ratio = (peer_lexical.max(business)) / peer_lexical.min(business).max(0.001);
        if ratio < 2.0 {
            let alumni_score = peer_lexical + business + 0.5;
            scores[3] = (Intent::FindAlumniBusiness, alumni_score);
            matched_patterns.push("alumni_business_cooccurrence".to_string());
        }
    }

    if scores.iter().all(|(_, s)| *s == 0.0) {
        return IntentResult::unscored();
    }

    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    let top = scores[0];
    let runner_up = scores[1];

    let secondary = if runner_up.1 > 0.0 && runner_up.1 >= top.1 * 0.75 && runner_up.0 != top.0 {
        Some(runner_up.0)
    } else {
        None
    };

    let top_index = 0;
    let confidence = softmax_confidence(&scores, top_index);

    IntentResult { primary: top.0, secondary, confidence, matched_patterns }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peers_intent_from_batch_language() {
        let r = classify("Find 1995 mechanical engineers from my batch");
        assert_eq!(r.primary, Intent::FindPeers);
    }

    #[test]
    fn peers_intent_from_bare_graduation_year() {
        let r = classify("Find 1995 mechanical engineers");
        assert_eq!(r.primary, Intent::FindPeers);
    }

    #[test]
    fn business_intent_from_service_language() {
        let r = classify("Find web development companies in Chennai");
        assert_eq!(r.primary, Intent::FindBusiness);
    }

    #[test]
    fn specific_person_intent() {
        let r = classify("Who is Sivakumar from USAM Technology");
        assert_eq!(r.primary, Intent::FindSpecificPerson);
    }

    #[test]
    fn alumni_business_on_balanced_cooccurrence() {
        let r = classify("Find 1995 batch mechanical entrepreneurs running companies in Chennai");
        assert_eq!(r.primary, Intent::FindAlumniBusiness);
    }

    #[test]
    fn empty_query_is_unscored() {
        let r = classify("");
        assert_eq!(r.confidence, 0.0);
        assert!(r.matched_patterns.is_empty());
    }
}
