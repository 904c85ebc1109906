//! List query value

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Filter and search criteria for a list view.
///
/// Compared by value: any difference in a filter or the search term is a
/// new query and resets the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    #[serde(default)]
    pub search_term: String,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Filters with a non-blank value, trimmed
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters
            .iter()
            .map(|(k, v)| (k.as_str(), v.trim()))
            .filter(|(_, v)| !v.is_empty())
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filters().next().is_some()
    }

    /// Trimmed search term, `None` when blank
    pub fn search(&self) -> Option<&str> {
        let term = self.search_term.trim();
        (!term.is_empty()).then_some(term)
    }

    /// Whether every required filter carries a value
    pub fn satisfies(&self, required: &[String]) -> bool {
        required.iter().all(|key| self.filter(key).is_some())
    }
}
