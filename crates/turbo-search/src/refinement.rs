//! Refinement selection state machine.
//!
//! Owns the user's query, sort and refinement choices. Every mutation is
//! synchronous and, when it changes anything, produces exactly one
//! [`Commit`] no matter how many attributes it touched; the session turns
//! each commit into a single pagination reset (and, except for query
//! changes, one cache invalidation).

use tracing::debug;

use crate::ids::{AttributeId, SortId};
use crate::params::{SearchState, Toggle};

/// What a commit changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A refinement value was toggled.
    Refinement {
        attribute: AttributeId,
        value: String,
        outcome: Toggle,
    },
    /// The sort rule was replaced.
    Sort(SortId),
    /// The free-text query changed.
    Query(Option<String>),
    /// Refinements and sort were reset together.
    Cleared,
}

/// A state change ready to be propagated downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Store revision after the change.
    pub revision: u64,
    /// State before the change, needed to invalidate its cached pages.
    pub previous: SearchState,
    pub mutation: Mutation,
}

/// Holds the current query, sort and refinement selection.
#[derive(Debug, Clone, Default)]
pub struct RefinementStore {
    state: SearchState,
    revision: u64,
}

impl RefinementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with an initial state (e.g. from a deep link).
    pub fn with_state(state: SearchState) -> Self {
        Self { state, revision: 0 }
    }

    /// Current parameters, without pagination fields.
    pub fn parameters(&self) -> &SearchState {
        &self.state
    }

    /// Number of commits so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Select `value` for `attribute`, or deselect it if already selected.
    pub fn toggle_refinement(
        &mut self,
        attribute: impl Into<AttributeId>,
        value: impl Into<String>,
    ) -> Commit {
        let attribute = attribute.into();
        let value = value.into();
        let previous = self.state.clone();
        let outcome = self
            .state
            .refinements
            .toggle(attribute.clone(), value.clone());
        self.commit(
            previous,
            Mutation::Refinement {
                attribute,
                value,
                outcome,
            },
        )
    }

    /// Replace the sort rule. Not validated against the backend's options;
    /// re-selecting the current rule still commits and restarts the results.
    pub fn set_sort(&mut self, sort: impl Into<SortId>) -> Commit {
        let sort = sort.into();
        let previous = self.state.clone();
        self.state.sort = Some(sort.clone());
        self.commit(previous, Mutation::Sort(sort))
    }

    /// Replace the free-text query; blank text clears it.
    pub fn set_query(&mut self, query: Option<&str>) -> Option<Commit> {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        if self.state.query == query {
            return None;
        }
        let previous = self.state.clone();
        self.state.query = query.clone();
        Some(self.commit(previous, Mutation::Query(query)))
    }

    /// Drop all refinements and the explicit sort, keeping the query.
    pub fn clear_all(&mut self) -> Option<Commit> {
        if self.state.refinements.is_empty() && self.state.sort.is_none() {
            return None;
        }
        let previous = self.state.clone();
        self.state.refinements.clear();
        self.state.sort = None;
        Some(self.commit(previous, Mutation::Cleared))
    }

    fn commit(&mut self, previous: SearchState, mutation: Mutation) -> Commit {
        self.revision += 1;
        debug!(revision = self.revision, ?mutation, "search state committed");
        Commit {
            revision: self.revision,
            previous,
            mutation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_is_identity() {
        let mut store = RefinementStore::new();
        store.toggle_refinement("size", "M");
        let before = store.parameters().clone();

        store.toggle_refinement("color", "red");
        store.toggle_refinement("color", "red");

        assert_eq!(store.parameters(), &before);
        assert_eq!(store.revision(), 3);
    }

    #[test]
    fn test_toggle_twice_on_selected_value_is_identity() {
        let mut store = RefinementStore::new();
        store.toggle_refinement("color", "red");
        store.toggle_refinement("color", "blue");
        let before = store.parameters().clone();

        let removed = store.toggle_refinement("color", "red");
        let added = store.toggle_refinement("color", "red");

        assert!(matches!(removed.mutation, Mutation::Refinement { outcome: Toggle::Removed, .. }));
        assert!(matches!(added.mutation, Mutation::Refinement { outcome: Toggle::Added, .. }));
        assert_eq!(store.parameters(), &before);
        assert_eq!(added.previous.refinements.value_count(), 1);
    }

    #[test]
    fn test_removing_last_value_deletes_key() {
        let mut store = RefinementStore::new();
        store.toggle_refinement("color", "red");
        let commit = store.toggle_refinement("color", "red");

        assert!(matches!(
            commit.mutation,
            Mutation::Refinement {
                outcome: Toggle::RemovedAttribute,
                ..
            }
        ));
        assert!(!store
            .parameters()
            .refinements
            .contains_attribute(&AttributeId::new("color")));
    }

    #[test]
    fn test_set_sort_is_unconditional() {
        let mut store = RefinementStore::new();
        let first = store.set_sort("no-such-rule");
        let second = store.set_sort("no-such-rule");
        assert_eq!(second.revision, first.revision + 1);
        assert_eq!(second.previous.sort, Some(SortId::new("no-such-rule")));
        assert_eq!(store.parameters().sort, Some(SortId::new("no-such-rule")));
    }

    #[test]
    fn test_clear_all_keeps_query_and_commits_once() {
        let mut store = RefinementStore::new();
        store.set_query(Some("shoes"));
        store.toggle_refinement("color", "red");
        store.toggle_refinement("color", "blue");
        store.toggle_refinement("size", "M");
        store.set_sort("price-low-to-high");
        let revision = store.revision();

        let commit = store.clear_all().unwrap();

        assert_eq!(commit.revision, revision + 1);
        assert_eq!(store.revision(), revision + 1);
        assert_eq!(commit.previous.refinements.value_count(), 3);
        assert!(store.parameters().refinements.is_empty());
        assert_eq!(store.parameters().sort, None);
        assert_eq!(store.parameters().query.as_deref(), Some("shoes"));
    }

    #[test]
    fn test_clear_all_on_clean_state_is_noop() {
        let mut store = RefinementStore::new();
        store.set_query(Some("shoes"));
        assert!(store.clear_all().is_none());
    }

    #[test]
    fn test_set_query_trims_and_detects_no_change() {
        let mut store = RefinementStore::new();
        assert!(store.set_query(Some("  boots ")).is_some());
        assert_eq!(store.parameters().query.as_deref(), Some("boots"));
        assert!(store.set_query(Some("boots")).is_none());
        assert!(store.set_query(Some("")).is_some());
        assert_eq!(store.parameters().query, None);
    }

    #[test]
    fn test_commit_carries_previous_state() {
        let mut store = RefinementStore::new();
        store.toggle_refinement("color", "red");
        let commit = store.set_sort("newest");
        assert_eq!(commit.previous.sort, None);
        assert!(commit
            .previous
            .refinements
            .contains(&AttributeId::new("color"), "red"));
    }
}
