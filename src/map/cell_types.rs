use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable descriptor shared by all cells of one type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellType {
    pub name: String,
    /// Interpolation weight of this type's height when blending between cells
    pub height_power: f32,
}

impl CellType {
    pub fn new(name: impl Into<String>, height_power: f32) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            height_power,
        })
    }
}

/// Type-name matching rule list.
///
/// Entries starting with `-` exclude a type. When any positive entry exists a
/// type must be listed; a list with only exclusions (or no entries) accepts
/// everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellTypeFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl CellTypeFilter {
    pub fn new<S: AsRef<str>>(rules: &[S]) -> Self {
        let mut filter = Self::default();
        for rule in rules.iter().map(AsRef::as_ref) {
            match rule.strip_prefix('-') {
                Some(excluded) => filter.exclude.push(excluded.to_string()),
                None => filter.include.push(rule.to_string()),
            }
        }
        if filter.include.is_empty() && !filter.exclude.is_empty() {
            debug!("Cell type filter has only exclusions: {:?}", filter.exclude);
        }
        filter
    }

    pub fn matches(&self, type_name: &str) -> bool {
        if self.exclude.iter().any(|t| t == type_name) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|t| t == type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = CellTypeFilter::new::<&str>(&[]);
        assert!(filter.matches("Ruins"));
        assert!(filter.matches("Water"));
    }

    #[test]
    fn test_positive_entries_restrict() {
        let filter = CellTypeFilter::new(&["Ruins", "Gate"]);
        assert!(filter.matches("Gate"));
        assert!(!filter.matches("Forest"));
    }

    #[test]
    fn test_exclusions() {
        let filter = CellTypeFilter::new(&["-Water"]);
        assert!(!filter.matches("Water"));
        assert!(filter.matches("Field"));

        let filter = CellTypeFilter::new(&["Ruins", "-Ruins"]);
        assert!(!filter.matches("Ruins"));
    }
}
