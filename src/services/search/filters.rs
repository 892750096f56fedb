//! Translates extracted entities into a relaxable set of search predicates
//! and progressively relaxing it when too few candidates survive.

use std::collections::BTreeSet;

use crate::models::entities::{ExtractedEntities, TurnoverTier};

/// Relaxation order when the filtered candidate set is too small. Year and
/// an explicit name are never relaxed.
const RELAXATION_ORDER: [RelaxableFilter; 4] = [
    RelaxableFilter::Services,
    RelaxableFilter::Skills,
    RelaxableFilter::City,
    RelaxableFilter::Turnover,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelaxableFilter {
    Services,
    Skills,
    City,
    Turnover,
}

#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub years: BTreeSet<i32>,
    pub branch: BTreeSet<String>,
    pub city: Option<String>,
    pub skills: BTreeSet<String>,
    pub services: BTreeSet<String>,
    pub turnover_tier: Option<TurnoverTier>,
    pub name: Option<String>,
    pub active_only: bool,
    relaxation_step: usize,
}

impl SearchFilters {
    pub fn from_entities(entities: &ExtractedEntities) -> Self {
        Self {
            years: entities.graduation_year.clone(),
            branch: entities.branch.clone(),
            city: entities.location.clone(),
            skills: entities.skills.clone(),
            services: entities.services.clone(),
            turnover_tier: entities.turnover_tier,
            name: entities.name.clone(),
            active_only: true,
            relaxation_step: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
            && self.branch.is_empty()
            && self.city.is_none()
            && self.skills.is_empty()
            && self.services.is_empty()
            && self.turnover_tier.is_none()
            && self.name.is_none()
    }

    /// Drops the next filter in the fixed relaxation order. Returns `false`
    /// once nothing relaxable remains.
    pub fn relax_next(&mut self) -> bool {
        while self.relaxation_step < RELAXATION_ORDER.len() {
            let filter = RELAXATION_ORDER[self.relaxation_step];
            self.relaxation_step += 1;
            let changed = match filter {
                RelaxableFilter::Services if !self.services.is_empty() => {
                    self.services.clear();
                    true
                },
                RelaxableFilter::Skills if !self.skills.is_empty() => {
                    self.skills.clear();
                    true
                },
                RelaxableFilter::City if self.city.is_some() => {
                    self.city = None;
                    true
                },
                RelaxableFilter::Turnover if self.turnover_tier.is_some() => {
                    self.turnover_tier = None;
                    true
                },
                _ => false,
            };
            if changed {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relaxation_never_touches_year_or_name() {
        let mut entities = ExtractedEntities::default();
        entities.graduation_year.insert(1995);
        entities.name = Some("Sivakumar".to_string());
        entities.services.insert("web development".to_string());
        entities.skills.insert("devops".to_string());
        entities.location = Some("Chennai".to_string());

        let mut filters = SearchFilters::from_entities(&entities);
        while filters.relax_next() {}

        assert!(filters.years.contains(&1995));
        assert_eq!(filters.name.as_deref(), Some("Sivakumar"));
        assert!(filters.services.is_empty());
        assert!(filters.skills.is_empty());
        assert!(filters.city.is_none());
    }

    #[test]
    fn relaxes_services_before_skills_before_city_before_turnover() {
        let mut entities = ExtractedEntities::default();
        entities.services.insert("web development".to_string());
        entities.skills.insert("devops".to_string());
        entities.location = Some("Chennai".to_string());
        entities.turnover_tier = Some(TurnoverTier::High);

        let mut filters = SearchFilters::from_entities(&entities);
        assert!(filters.relax_next());
        assert!(filters.services.is_empty() && !filters.skills.is_empty());
        assert!(filters.relax_next());
        assert!(filters.skills.is_empty() && filters.city.is_some());
        assert!(filters.relax_next());
        assert!(filters.city.is_none() && filters.turnover_tier.is_some());
        assert!(filters.relax_next());
        assert!(filters.turnover_tier.is_none());
        assert!(!filters.relax_next());
    }
}
