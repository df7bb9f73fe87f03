//! ``src/model/filter.rs``
//! ============================================================================
//! # Filter criteria: free-text search plus categorical constraints
//!
//! All active predicates combine with logical AND. `CategoryFilter::All` is
//! the "no filter" sentinel and matches every record.

use std::fmt;

use compact_str::CompactString;
use indexmap::IndexMap;

use crate::model::record::Record;

/// Value of one categorical criterion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Is(CompactString),
}

impl CategoryFilter {
    /// Sentinel spelling used by select boxes.
    pub const ALL: &'static str = "all";

    /// Parse a select-box value; `all` (any case) and the empty string map to
    /// the sentinel.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(Self::ALL) {
            Self::All
        } else {
            Self::Is(CompactString::from(value))
        }
    }

    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(Self::ALL),
            Self::Is(value) => f.write_str(value),
        }
    }
}

/// Active search and categorical constraints for one list.
#[derive(Debug, Clone)]
pub struct FilterCriteria<K> {
    search: CompactString,
    search_lower: String,
    categories: IndexMap<K, CategoryFilter>,
}

impl<K> Default for FilterCriteria<K> {
    fn default() -> Self {
        Self {
            search: CompactString::default(),
            search_lower: String::new(),
            categories: IndexMap::new(),
        }
    }
}

impl<K: Copy + Eq + std::hash::Hash> FilterCriteria<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_search(mut self, query: &str) -> Self {
        self.set_search(query);
        self
    }

    #[must_use]
    pub fn with_category(mut self, key: K, value: CategoryFilter) -> Self {
        self.set_category(key, value);
        self
    }

    /// Returns true if the criteria changed.
    pub fn set_search(&mut self, query: &str) -> bool {
        if self.search == query {
            return false;
        }
        self.search = CompactString::from(query);
        self.search_lower = query.trim().to_lowercase();
        true
    }

    /// Returns true if the criteria changed.
    pub fn set_category(&mut self, key: K, value: CategoryFilter) -> bool {
        let previous = if value.is_all() {
            self.categories.shift_remove(&key)
        } else {
            self.categories.insert(key, value.clone())
        };
        previous.unwrap_or_default() != value
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub fn category(&self, key: K) -> &CategoryFilter {
        static ALL: CategoryFilter = CategoryFilter::All;
        self.categories.get(&key).unwrap_or(&ALL)
    }

    /// True when no predicate is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search_lower.is_empty() && self.categories.is_empty()
    }

    /// Drop every predicate. Returns true if anything was active.
    pub fn clear(&mut self) -> bool {
        let was_active = !self.is_empty() || !self.search.is_empty();
        self.search.clear();
        self.search_lower.clear();
        self.categories.clear();
        was_active
    }

    /// Whether `record` satisfies every active predicate.
    #[must_use]
    pub fn matches<R>(&self, record: &R) -> bool
    where
        R: Record<Key = K>,
    {
        self.matches_search(record) && self.matches_categories(record)
    }

    fn matches_search<R: Record<Key = K>>(&self, record: &R) -> bool {
        if self.search_lower.is_empty() {
            return true;
        }
        R::SEARCH_KEYS
            .iter()
            .any(|key| record.field(*key).contains_lowercase(&self.search_lower))
    }

    fn matches_categories<R: Record<Key = K>>(&self, record: &R) -> bool {
        self.categories.iter().all(|(key, filter)| match filter {
            CategoryFilter::All => true,
            CategoryFilter::Is(expected) => record.field(*key).matches_category(expected),
        })
    }
}
