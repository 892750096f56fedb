//! Renders a ranked result set into the conversational string the response
//! envelope carries. Pure and allocation-light: no I/O, no
//! shared state, safe to call from a hot request path.

use crate::models::entities::ExtractedEntities;
use crate::models::intent::Intent;
use crate::models::member::{humanize_turnover, ScoredMember};

const FIND_BUSINESS_MAX_ROWS: usize = 10;
const FIND_PEERS_MAX_ROWS: usize = 10;
const FIND_SPECIFIC_PERSON_MAX_ROWS: usize = 5;
const FIND_ALUMNI_BUSINESS_MAX_ROWS: usize = 10;

pub struct FormatContext<'a> {
    pub query: &'a str,
    pub intent: Intent,
    pub entities: &'a ExtractedEntities,
    pub result_count: usize,
}

/// Formats `members` into a conversational string, dispatching on intent.
/// `members` is assumed already ranked; this function
/// truncates, it does not re-sort.
pub fn format(members: &[ScoredMember], ctx: &FormatContext) -> String {
    if members.is_empty() {
        return format_empty(ctx);
    }

    match ctx.intent {
        Intent::FindBusiness => format_find_business(members, ctx),
        Intent::FindPeers => format_find_peers(members, ctx),
        Intent::FindSpecificPerson => format_find_specific_person(members),
        Intent::FindAlumniBusiness => format_find_alumni_business(members, ctx),
    }
}

fn short_year(year: i32) -> String {
    format!("'{:02}", year.rem_euclid(100))
}

fn format_find_business(members: &[ScoredMember], ctx: &FormatContext) -> String {
    let location = ctx.entities.location.as_deref().unwrap_or("your area");
    let mut out = format!("Here are businesses that can help, around {location}:\n");
    for scored in members.iter().take(FIND_BUSINESS_MAX_ROWS) {
        let m = &scored.member;
        let contact = m.contact_phone.as_deref().or(m.contact_email.as_deref()).unwrap_or("no contact on file");
        out.push_str(&format!(
            "- {} ({}) — {}, {} — {} — turnover {}\n",
            m.organization,
            m.city,
            m.services.join(", "),
            contact,
            scored.matched_fields.iter().cloned().collect::<Vec<_>>().join("/"),
            humanize_turnover(m.turnover_crores),
        ));
    }
    append_truncation_note(&mut out, members.len(), FIND_BUSINESS_MAX_ROWS);
    out
}

fn format_find_peers(members: &[ScoredMember], ctx: &FormatContext) -> String {
    let year_label = ctx
        .entities
        .graduation_year
        .iter()
        .next()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "your".to_string());
    let branch_label = ctx.entities.branch.iter().next().cloned().unwrap_or_else(|| "all branches".to_string());
    let mut out = format!("Batchmates from {year_label} ({branch_label}):\n");
    for scored in members.iter().take(FIND_PEERS_MAX_ROWS) {
        let m = &scored.member;
        out.push_str(&format!(
            "- {} {}, {}, {} at {}, {}\n",
            short_year(m.year),
            m.degree,
            m.branch,
            m.designation,
            m.organization,
            m.city,
        ));
    }
    append_truncation_note(&mut out, members.len(), FIND_PEERS_MAX_ROWS);
    out
}

fn format_find_specific_person(members: &[ScoredMember]) -> String {
    let mut out = String::new();
    for scored in members.iter().take(FIND_SPECIFIC_PERSON_MAX_ROWS) {
        let m = &scored.member;
        out.push_str(&format!(
            "{} — {} at {}\nBatch: {} {} {}, {}\nSkills: {}\nServices: {}\nContact: {}\nTurnover: {}\n\n",
            m.name,
            m.designation,
            m.organization,
            m.year,
            m.degree,
            m.branch,
            m.city,
            m.skills.join(", "),
            m.services.join(", "),
            m.contact_phone.as_deref().or(m.contact_email.as_deref()).unwrap_or("no contact on file"),
            humanize_turnover(m.turnover_crores),
        ));
    }
    out.trim_end().to_string()
}

fn format_find_alumni_business(members: &[ScoredMember], ctx: &FormatContext) -> String {
    let mut out = "Alumni-run businesses matching your search:\n".to_string();
    for scored in members.iter().take(FIND_ALUMNI_BUSINESS_MAX_ROWS) {
        let m = &scored.member;
        out.push_str(&format!(
            "- {} ({}), {} {}, {} — {} — turnover {}\n",
            m.name,
            m.organization,
            short_year(m.year),
            m.branch,
            m.services.join(", "),
            m.city,
            humanize_turnover(m.turnover_crores),
        ));
    }
    append_truncation_note(&mut out, members.len(), FIND_ALUMNI_BUSINESS_MAX_ROWS);
    let _ = ctx;
    out
}

fn format_empty(ctx: &FormatContext) -> String {
    let mut named_filters = Vec::new();
    if !ctx.entities.graduation_year.is_empty() {
        named_filters.push("graduation year".to_string());
    }
    if !ctx.entities.branch.is_empty() {
        named_filters.push("branch".to_string());
    }
    if ctx.entities.location.is_some() {
        named_filters.push("location".to_string());
    }
    if !ctx.entities.services.is_empty() {
        named_filters.push("service".to_string());
    }
    if !ctx.entities.skills.is_empty() {
        named_filters.push("skill".to_string());
    }

    if named_filters.is_empty() {
        format!("No matches for \"{}\". Try different keywords or broaden your search.", ctx.query)
    } else {
        format!(
            "No matches for \"{}\" with the {} filter{} applied. Try relaxing {} or using different keywords.",
            ctx.query,
            named_filters.join(", "),
            if named_filters.len() > 1 { "s" } else { "" },
            if named_filters.len() > 1 { "one of them" } else { "it" },
        )
    }
}

fn append_truncation_note(out: &mut String, total: usize, shown: usize) {
    if total > shown {
        out.push_str(&format!("Found {total} results, showing top {shown}.\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn member(id: i64, name: &str) -> crate::models::member::MemberRecord {
        crate::models::member::MemberRecord {
            id,
            name: name.to_string(),
            year: 1995,
            degree: "B.E".to_string(),
            branch: "Mechanical".to_string(),
            city: "Chennai".to_string(),
            organization: "USAM Technology".to_string(),
            designation: "Founder".to_string(),
            skills: vec!["leadership".to_string()],
            services: vec!["it infrastructure".to_string()],
            turnover_crores: Some(15.0),
            contact_phone: Some("9999999999".to_string()),
            contact_email: None,
            is_active: true,
        }
    }

    fn scored(id: i64, name: &str) -> ScoredMember {
        ScoredMember {
            member: member(id, name),
            relevance_score: 0.9,
            semantic_score: 0.8,
            keyword_score: 0.7,
            matched_fields: BTreeSet::from(["year".to_string(), "branch".to_string()]),
        }
    }

    #[test]
    fn empty_results_name_the_active_filters() {
        let mut entities = ExtractedEntities::default();
        entities.location = Some("Chennai".to_string());
        let ctx = FormatContext { query: "find anyone", intent: Intent::FindBusiness, entities: &entities, result_count: 0 };
        let text = format(&[], &ctx);
        assert!(text.contains("location"));
    }

    #[test]
    fn find_business_includes_humanized_turnover() {
        let members = vec![scored(1, "Siva Kumar")];
        let entities = ExtractedEntities::default();
        let ctx = FormatContext { query: "q", intent: Intent::FindBusiness, entities: &entities, result_count: 1 };
        let text = format(&members, &ctx);
        assert!(text.contains("₹15.0 Cr"));
    }

    #[test]
    fn find_peers_uses_short_year_format() {
        let members = vec![scored(1, "Siva Kumar")];
        let entities = ExtractedEntities::default();
        let ctx = FormatContext { query: "q", intent: Intent::FindPeers, entities: &entities, result_count: 1 };
        let text = format(&members, &ctx);
        assert!(text.contains("'95"));
    }

    #[test]
    fn find_specific_person_caps_at_five_rows() {
        let members: Vec<ScoredMember> = (0..8).map(|i| scored(i, "Someone")).collect();
        let entities = ExtractedEntities::default();
        let ctx = FormatContext { query: "q", intent: Intent::FindSpecificPerson, entities: &entities, result_count: 8 };
        let text = format(&members, &ctx);
        assert_eq!(text.matches("Someone").count(), 5);
    }

    #[test]
    fn truncation_note_appears_when_results_exceed_cap() {
        let members: Vec<ScoredMember> = (0..12).map(|i| scored(i, "Someone")).collect();
        let entities = ExtractedEntities::default();
        let ctx = FormatContext { query: "q", intent: Intent::FindBusiness, entities: &entities, result_count: 12 };
        let text = format(&members, &ctx);
        assert!(text.contains("Found 12 results"));
    }
}
