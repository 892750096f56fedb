//! Pure canonicalization functions shared by the regex and LLM extraction
//! paths. Both paths must agree bit-exactly, so nothing here touches
//! process-wide state — no ambient globals inside pure functions.

use std::collections::HashMap;

use chrono::Datelike;
use once_cell::sync::Lazy;

/// (variant, canonical) pairs for city names. Matching is case-insensitive
/// and trims surrounding whitespace before lookup.
static CITY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("chennai", "Chennai"),
        ("madras", "Chennai"),
        ("bangalore", "Bangalore"),
        ("bengaluru", "Bangalore"),
        ("mumbai", "Mumbai"),
        ("bombay", "Mumbai"),
        ("delhi", "Delhi"),
        ("new delhi", "Delhi"),
        ("hyderabad", "Hyderabad"),
        ("coimbatore", "Coimbatore"),
        ("pune", "Pune"),
        ("kolkata", "Kolkata"),
        ("calcutta", "Kolkata"),
        ("trichy", "Tiruchirappalli"),
        ("tiruchirappalli", "Tiruchirappalli"),
        ("madurai", "Madurai"),
    ])
});

/// (variant, canonical, short tag) for engineering/academic branches.
static BRANCH_ALIASES: Lazy<HashMap<&'static str, (&'static str, &'static str)>> = Lazy::new(|| {
    HashMap::from([
        ("ece", ("Electronics and Communication", "ECE")),
        ("electronics and communication", ("Electronics and Communication", "ECE")),
        ("cse", ("Computer Science", "CSE")),
        ("comp sci", ("Computer Science", "CSE")),
        ("computer science", ("Computer Science", "CSE")),
        ("mech", ("Mechanical", "MECH")),
        ("mechanical", ("Mechanical", "MECH")),
        ("civil", ("Civil", "CIVIL")),
        ("eee", ("Electrical and Electronics", "EEE")),
        ("electrical and electronics", ("Electrical and Electronics", "EEE")),
        ("it", ("Information Technology", "IT")),
        ("information technology", ("Information Technology", "IT")),
        ("chemical", ("Chemical", "CHEM")),
        ("aero", ("Aeronautical", "AERO")),
        ("aeronautical", ("Aeronautical", "AERO")),
    ])
});

/// (variant, canonical) for degree abbreviations.
static DEGREE_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("be", "B.E"),
        ("b.e", "B.E"),
        ("b.e.", "B.E"),
        ("btech", "B.Tech"),
        ("b.tech", "B.Tech"),
        ("me", "M.E"),
        ("m.e", "M.E"),
        ("mtech", "M.Tech"),
        ("m.tech", "M.Tech"),
        ("mba", "MBA"),
        ("mca", "MCA"),
        ("bca", "BCA"),
    ])
});

fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Maps a free-text city mention to its canonical title-cased name.
/// Returns `None` for anything not in the known lexicon.
pub fn normalize_city(s: &str) -> Option<String> {
    CITY_ALIASES.get(normalize_key(s).as_str()).map(|v| v.to_string())
}

/// Expands a branch abbreviation to its canonical name and short tag.
/// Returns `None` if `s` doesn't match any known branch variant.
pub fn normalize_branch(s: &str) -> Option<(String, String)> {
    BRANCH_ALIASES
        .get(normalize_key(s).as_str())
        .map(|(canonical, tag)| (canonical.to_string(), tag.to_string()))
}

/// Maps a degree mention to its canonical form.
pub fn normalize_degree(s: &str) -> Option<String> {
    let key = normalize_key(s).replace(' ', "");
    DEGREE_ALIASES.get(key.as_str()).map(|v| v.to_string())
}

/// Resolves a 2- or 4-digit graduation year string to a 4-digit year.
///
/// For 2-digit input, `current_year` drives the pivot: values at or below
/// `(current_year + 5) % 100` are treated as 20xx, values above it as
/// 19xx. A 19xx candidate is rejected (returns `None`) if it would land
/// before 1950 — a 2-digit year can never unambiguously name a graduation
/// year that old, so we refuse to guess rather than silently emit one.
/// This keeps every produced year within `[1950, current_year + 5]` and
/// the rule testable without a wall clock; [`normalize_year`] supplies the
/// real current year.
pub fn normalize_year_with_pivot(s: &str, current_year: i32) -> Option<i32> {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        4 => digits.parse::<i32>().ok(),
        2 => {
            let val: i32 = digits.parse().ok()?;
            let pivot = (current_year + 5).rem_euclid(100);
            let candidate = if val <= pivot { 2000 + val } else { 1900 + val };
            if candidate < 1950 { None } else { Some(candidate) }
        },
        _ => None,
    }
}

pub fn normalize_year(s: &str) -> Option<i32> {
    let current_year = chrono::Utc::now().year();
    normalize_year_with_pivot(s, current_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_aliases_are_case_insensitive() {
        assert_eq!(normalize_city("CHENNAI"), Some("Chennai".to_string()));
        assert_eq!(normalize_city(" madras "), Some("Chennai".to_string()));
        assert_eq!(normalize_city("Atlantis"), None);
    }

    #[test]
    fn city_normalization_is_idempotent() {
        let once = normalize_city("chennai").unwrap();
        assert_eq!(normalize_city(&once), Some(once));
    }

    #[test]
    fn branch_expands_abbreviations() {
        assert_eq!(
            normalize_branch("ECE"),
            Some(("Electronics and Communication".to_string(), "ECE".to_string()))
        );
        assert_eq!(
            normalize_branch("comp sci"),
            Some(("Computer Science".to_string(), "CSE".to_string()))
        );
        assert_eq!(normalize_branch("mech"), Some(("Mechanical".to_string(), "MECH".to_string())));
    }

    #[test]
    fn branch_normalization_is_idempotent() {
        let (canonical, _tag) = normalize_branch("mech").unwrap();
        assert_eq!(normalize_branch(&canonical).unwrap().0, canonical);
    }

    #[test]
    fn degree_normalization() {
        assert_eq!(normalize_degree("b.e"), Some("B.E".to_string()));
        assert_eq!(normalize_degree("MBA"), Some("MBA".to_string()));
        assert_eq!(normalize_degree("unknown-degree"), None);
    }

    #[test]
    fn degree_normalization_is_idempotent() {
        let once = normalize_degree("btech").unwrap();
        assert_eq!(normalize_degree(&once), Some(once));
    }

    #[test]
    fn four_digit_year_passes_through() {
        assert_eq!(normalize_year_with_pivot("1995", 2026), Some(1995));
    }

    #[test]
    fn two_digit_year_pivots_on_current_year() {
        // current year 2026 -> pivot 26
        assert_eq!(normalize_year_with_pivot("95", 2026), Some(1995));
        assert_eq!(normalize_year_with_pivot("05", 2026), Some(2005));
        assert_eq!(normalize_year_with_pivot("00", 2026), Some(2000));
    }

    #[test]
    fn year_normalization_is_idempotent_on_four_digit_form() {
        let y = normalize_year_with_pivot("95", 2026).unwrap();
        assert_eq!(normalize_year_with_pivot(&y.to_string(), 2026), Some(y));
    }

    #[test]
    fn two_digit_year_output_always_in_range() {
        let current_year = 2026;
        for val in 0..100 {
            if let Some(year) = normalize_year_with_pivot(&format!("{val:02}"), current_year) {
                assert!(
                    (1950..=current_year + 5).contains(&year),
                    "year {year} out of range for input {val:02}"
                );
            }
        }
    }
}
