//! Produces follow-up suggestions after a search completes.
//! Always exactly 3 non-empty strings, dispatched on intent; a distinct
//! branch covers the empty-result case.

use crate::models::entities::ExtractedEntities;
use crate::models::intent::Intent;

pub struct SuggestionContext<'a> {
    pub intent: Intent,
    pub entities: &'a ExtractedEntities,
    pub result_count: usize,
}

pub fn suggest(ctx: &SuggestionContext) -> Vec<String> {
    if ctx.result_count == 0 {
        return empty_result_suggestions(ctx.entities);
    }

    match ctx.intent {
        Intent::FindBusiness => find_business_suggestions(ctx.entities),
        Intent::FindPeers => find_peers_suggestions(ctx.entities),
        Intent::FindSpecificPerson => find_specific_person_suggestions(),
        Intent::FindAlumniBusiness => find_alumni_business_suggestions(ctx.entities),
    }
}

fn find_business_suggestions(entities: &ExtractedEntities) -> Vec<String> {
    let location = entities.location.as_deref().unwrap_or("a nearby city");
    vec![
        format!("Try {location} along with a neighbouring city"),
        "Explore an adjacent service category".to_string(),
        "Add a graduation batch filter to narrow results".to_string(),
    ]
}

fn find_peers_suggestions(entities: &ExtractedEntities) -> Vec<String> {
    let year = entities.graduation_year.iter().next().copied();
    let nearby = match year {
        Some(y) => format!("Include batches {} and {}", y - 1, y + 1),
        None => "Include one year before and after your batch".to_string(),
    };
    vec![
        nearby,
        "Add or change the branch filter".to_string(),
        "Look for businesses run by this batch instead".to_string(),
    ]
}

fn find_specific_person_suggestions() -> Vec<String> {
    vec![
        "Search others from the same batch".to_string(),
        "Search others at the same organization".to_string(),
        "Search others with the same designation".to_string(),
    ]
}

fn find_alumni_business_suggestions(entities: &ExtractedEntities) -> Vec<String> {
    let year = entities.graduation_year.iter().next().copied();
    let adjacent_batch = match year {
        Some(y) => format!("Try the {} or {} batch", y - 1, y + 1),
        None => "Try an adjacent graduation batch".to_string(),
    };
    vec![adjacent_batch, "Try an alternative service".to_string(), "Broaden the location filter".to_string()]
}

fn empty_result_suggestions(entities: &ExtractedEntities) -> Vec<String> {
    let mut active_filters = Vec::new();
    if !entities.services.is_empty() {
        active_filters.push("service");
    }
    if !entities.skills.is_empty() {
        active_filters.push("skill");
    }
    if entities.location.is_some() {
        active_filters.push("location");
    }
    if !entities.branch.is_empty() {
        active_filters.push("branch");
    }

    if active_filters.is_empty() {
        return vec![
            "Broaden your search".to_string(),
            "Try different keywords".to_string(),
            "Remove one of your filters".to_string(),
        ];
    }

    active_filters.into_iter().take(3).map(|f| format!("Search without the {f} filter")).chain(
        std::iter::repeat_with(|| "Try different keywords".to_string())
    ).take(3).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_returns_exactly_three_non_empty_strings() {
        let entities = ExtractedEntities::default();
        for intent in [Intent::FindBusiness, Intent::FindPeers, Intent::FindSpecificPerson, Intent::FindAlumniBusiness] {
            for result_count in [0usize, 5usize] {
                let ctx = SuggestionContext { intent, entities: &entities, result_count };
                let suggestions = suggest(&ctx);
                assert_eq!(suggestions.len(), 3, "intent={intent:?} result_count={result_count}");
                assert!(suggestions.iter().all(|s| !s.is_empty()));
            }
        }
    }

    #[test]
    fn empty_result_names_active_filters() {
        let mut entities = ExtractedEntities::default();
        entities.location = Some("Chennai".to_string());
        let ctx = SuggestionContext { intent: Intent::FindBusiness, entities: &entities, result_count: 0 };
        let suggestions = suggest(&ctx);
        assert!(suggestions[0].contains("location"));
    }

    #[test]
    fn find_peers_suggests_adjacent_batches() {
        let mut entities = ExtractedEntities::default();
        entities.graduation_year.insert(1995);
        let ctx = SuggestionContext { intent: Intent::FindPeers, entities: &entities, result_count: 3 };
        let suggestions = suggest(&ctx);
        assert!(suggestions[0].contains("1994") && suggestions[0].contains("1996"));
    }
}
