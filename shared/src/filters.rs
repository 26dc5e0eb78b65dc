//! Filter selection state and the local manufacturer lookup.

use std::collections::BTreeSet;

use crate::models::{FilterOption, SearchFilters};

/// Maximum manufacturers shown by the local lookup.
pub const MANUFACTURER_MATCH_LIMIT: usize = 20;

/// A single user filter action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    ToggleCategory(String),
    ToggleManufacturer(String),
    /// A specific certification name
    ToggleCertification(String),
    /// "Has any certification"
    ToggleCertifications,
    ToggleCarbonData,
    Clear,
}

/// Filters currently selected in the sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub categories: BTreeSet<String>,
    pub manufacturers: BTreeSet<String>,
    pub certifications: BTreeSet<String>,
    pub has_certifications: bool,
    pub has_carbon_data: bool,
}

impl FilterState {
    pub fn apply(&mut self, change: FilterChange) {
        match change {
            FilterChange::ToggleCategory(name) => toggle(&mut self.categories, name),
            FilterChange::ToggleManufacturer(name) => toggle(&mut self.manufacturers, name),
            FilterChange::ToggleCertification(name) => toggle(&mut self.certifications, name),
            FilterChange::ToggleCertifications => self.has_certifications = !self.has_certifications,
            FilterChange::ToggleCarbonData => self.has_carbon_data = !self.has_carbon_data,
            FilterChange::Clear => *self = Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.manufacturers.is_empty()
            && self.certifications.is_empty()
            && !self.has_certifications
            && !self.has_carbon_data
    }

    /// Number of active filters, for the sidebar badge.
    pub fn active_count(&self) -> usize {
        self.categories.len()
            + self.manufacturers.len()
            + self.certifications.len()
            + usize::from(self.has_certifications)
            + usize::from(self.has_carbon_data)
    }

    pub fn to_request(&self) -> SearchFilters {
        SearchFilters {
            categories: self.categories.iter().cloned().collect(),
            manufacturers: self.manufacturers.iter().cloned().collect(),
            certifications: self.certifications.iter().cloned().collect(),
            has_certifications: self.has_certifications,
            has_carbon_data: self.has_carbon_data,
        }
    }
}

fn toggle(set: &mut BTreeSet<String>, name: String) {
    if !set.remove(&name) {
        set.insert(name);
    }
}

/// Case-insensitive substring match over the manufacturer list, capped at
/// [`MANUFACTURER_MATCH_LIMIT`]. An empty term matches everything.
pub fn search_manufacturers<'a>(manufacturers: &'a [FilterOption], term: &str) -> Vec<&'a FilterOption> {
    let needle = term.trim().to_lowercase();
    manufacturers
        .iter()
        .filter(|m| m.name.to_lowercase().contains(&needle))
        .take(MANUFACTURER_MATCH_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(name: &str) -> FilterOption {
        FilterOption {
            name: name.to_string(),
            count: 1,
        }
    }

    #[test]
    fn test_toggle_and_clear() {
        let mut filters = FilterState::default();
        filters.apply(FilterChange::ToggleCategory("Flooring".to_string()));
        filters.apply(FilterChange::ToggleManufacturer("Acme".to_string()));
        filters.apply(FilterChange::ToggleCarbonData);
        filters.apply(FilterChange::ToggleCertification("GreenTag".to_string()));
        filters.apply(FilterChange::ToggleCertification("Declare".to_string()));
        assert_eq!(filters.active_count(), 5);

        filters.apply(FilterChange::ToggleCategory("Flooring".to_string()));
        assert!(filters.categories.is_empty());

        let request = filters.to_request();
        assert_eq!(request.manufacturers, vec!["Acme"]);
        assert!(request.has_carbon_data);
        assert!(!request.has_certifications);
        assert_eq!(request.certifications, vec!["Declare", "GreenTag"]);

        filters.apply(FilterChange::ToggleCertification("Declare".to_string()));
        assert_eq!(filters.to_request().certifications, vec!["GreenTag"]);

        filters.apply(FilterChange::Clear);
        assert!(filters.is_empty());
    }

    #[test]
    fn test_manufacturer_search_case_insensitive() {
        let list = vec![option("Armstrong"), option("Interface"), option("ARMOR Co")];
        let names: Vec<_> = search_manufacturers(&list, "arm").iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Armstrong", "ARMOR Co"]);
        assert!(search_manufacturers(&list, "zzz").is_empty());
    }

    #[test]
    fn test_manufacturer_search_capped() {
        let list: Vec<_> = (0..50).map(|i| option(&format!("Maker {}", i))).collect();
        assert_eq!(search_manufacturers(&list, "maker").len(), MANUFACTURER_MATCH_LIMIT);
        assert_eq!(search_manufacturers(&list, "").len(), MANUFACTURER_MATCH_LIMIT);
        assert_eq!(search_manufacturers(&list, "Maker 4").len(), 11);
    }
}
