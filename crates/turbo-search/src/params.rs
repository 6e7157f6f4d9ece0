//! Search parameters and the refinement selection they carry.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::{AttributeId, SortId};

/// Largest page the catalog backend accepts.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Outcome of toggling a refinement value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// The value was not selected and now is.
    Added,
    /// The value was removed; other values remain for the attribute.
    Removed,
    /// The last value was removed, so the attribute itself is gone.
    RemovedAttribute,
}

/// One attribute with its selected values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedRefinement {
    pub attribute_id: AttributeId,
    pub values: Vec<String>,
}

/// Selected refinement values per attribute.
///
/// Keeps selection order (it drives the order of active-filter chips) while
/// behaving as a map of sets: values are unique per attribute, an attribute
/// never maps to an empty set, and equality ignores selection order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Refinements {
    entries: Vec<SelectedRefinement>,
}

impl Refinements {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no attribute is refined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of refined attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total number of selected values across attributes.
    pub fn value_count(&self) -> usize {
        self.entries.iter().map(|e| e.values.len()).sum()
    }

    /// Whether `value` is selected for `attribute`.
    pub fn contains(&self, attribute: &AttributeId, value: &str) -> bool {
        self.values(attribute)
            .map(|values| values.iter().any(|v| v == value))
            .unwrap_or(false)
    }

    /// Whether the attribute key is present at all.
    pub fn contains_attribute(&self, attribute: &AttributeId) -> bool {
        self.position(attribute).is_some()
    }

    /// Selected values for an attribute, in selection order.
    pub fn values(&self, attribute: &AttributeId) -> Option<&[String]> {
        self.position(attribute)
            .map(|idx| self.entries[idx].values.as_slice())
    }

    /// Iterate attributes and their values in selection order.
    pub fn iter(&self) -> impl Iterator<Item = (&AttributeId, &[String])> {
        self.entries
            .iter()
            .map(|e| (&e.attribute_id, e.values.as_slice()))
    }

    /// Add a value. Returns false if it was already selected.
    pub fn insert(&mut self, attribute: AttributeId, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.position(&attribute) {
            Some(idx) => {
                let values = &mut self.entries[idx].values;
                if values.contains(&value) {
                    false
                } else {
                    values.push(value);
                    true
                }
            }
            None => {
                self.entries.push(SelectedRefinement {
                    attribute_id: attribute,
                    values: vec![value],
                });
                true
            }
        }
    }

    /// Remove a value, dropping the attribute once its last value is gone.
    /// Returns `None` if the value was not selected.
    pub fn remove(&mut self, attribute: &AttributeId, value: &str) -> Option<Toggle> {
        let idx = self.position(attribute)?;
        let values = &mut self.entries[idx].values;
        let pos = values.iter().position(|v| v == value)?;
        values.remove(pos);
        if values.is_empty() {
            self.entries.remove(idx);
            Some(Toggle::RemovedAttribute)
        } else {
            Some(Toggle::Removed)
        }
    }

    /// Add the value if absent, remove it if present.
    pub fn toggle(&mut self, attribute: AttributeId, value: impl Into<String>) -> Toggle {
        let value = value.into();
        match self.remove(&attribute, &value) {
            Some(outcome) => outcome,
            None => {
                self.insert(attribute, value);
                Toggle::Added
            }
        }
    }

    /// Remove every selection.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Sorted attribute -> sorted value set view.
    pub fn canonical(&self) -> BTreeMap<&AttributeId, BTreeSet<&str>> {
        self.entries
            .iter()
            .map(|e| (&e.attribute_id, e.values.iter().map(String::as_str).collect()))
            .collect()
    }

    fn position(&self, attribute: &AttributeId) -> Option<usize> {
        self.entries.iter().position(|e| &e.attribute_id == attribute)
    }
}

impl PartialEq for Refinements {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Refinements {}

impl FromIterator<(AttributeId, String)> for Refinements {
    fn from_iter<I: IntoIterator<Item = (AttributeId, String)>>(iter: I) -> Self {
        let mut refinements = Refinements::new();
        for (attribute, value) in iter {
            refinements.insert(attribute, value);
        }
        refinements
    }
}

/// Extra response-shaping options sent with every search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Response expansions, e.g. `images`, `prices`, `variations`.
    pub expand: Vec<String>,
    /// Property selector restricting the returned fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
    pub all_images: bool,
    pub per_pricebook: bool,
    pub all_variation_properties: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            expand: vec!["images".to_string(), "prices".to_string()],
            select: None,
            all_images: false,
            per_pricebook: false,
            all_variation_properties: false,
        }
    }
}

/// The user-controlled part of a search: everything except pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    pub query: Option<String>,
    pub sort: Option<SortId>,
    pub refinements: Refinements,
}

impl SearchState {
    /// Combine with a scope into concrete parameters at `offset`.
    pub fn to_parameters(&self, scope: &SearchScope, offset: u32) -> SearchParameters {
        SearchParameters {
            query: self.query.clone(),
            sort: self.sort.clone(),
            refinements: self.refinements.clone(),
            offset,
            limit: scope.limit,
            locale: scope.locale.clone(),
            currency: scope.currency.clone(),
            options: scope.options.clone(),
        }
    }
}

/// Session-wide settings that stay fixed while the user refines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchScope {
    pub limit: u32,
    pub locale: String,
    pub currency: String,
    pub options: RequestOptions,
}

impl SearchScope {
    /// Create a scope; `limit` is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(limit: u32, locale: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            locale: locale.into(),
            currency: currency.into(),
            options: RequestOptions::default(),
        }
    }

    /// Replace the request options.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// A fully resolved set of parameters for one backend search call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameters {
    pub query: Option<String>,
    pub sort: Option<SortId>,
    pub refinements: Refinements,
    pub offset: u32,
    pub limit: u32,
    pub locale: String,
    pub currency: String,
    pub options: RequestOptions,
}

impl SearchParameters {
    /// Parameters for the first page of an unfiltered search.
    pub fn new(scope: &SearchScope) -> Self {
        SearchState::default().to_parameters(scope, 0)
    }

    /// Set the free-text query; blank text clears it.
    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        let q = q.into();
        self.query = if q.trim().is_empty() { None } else { Some(q) };
        self
    }

    /// Set the sort rule.
    pub fn with_sort(mut self, sort: impl Into<SortId>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Select one refinement value.
    pub fn with_refinement(mut self, attribute: impl Into<AttributeId>, value: impl Into<String>) -> Self {
        self.refinements.insert(attribute.into(), value);
        self
    }

    /// Same parameters addressing another page.
    pub fn at_offset(&self, offset: u32) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }

    /// The non-pagination part of these parameters.
    pub fn state(&self) -> SearchState {
        SearchState {
            query: self.query.clone(),
            sort: self.sort.clone(),
            refinements: self.refinements.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(s: &str) -> AttributeId {
        AttributeId::new(s)
    }

    #[test]
    fn test_toggle_twice_restores_selection() {
        let mut r = Refinements::new();
        r.insert(attr("size"), "M");
        let before = r.clone();

        assert_eq!(r.toggle(attr("color"), "red"), Toggle::Added);
        assert_eq!(r.toggle(attr("color"), "red"), Toggle::RemovedAttribute);
        assert_eq!(r, before);
    }

    #[test]
    fn test_toggle_twice_on_multi_valued_attribute() {
        let mut r = Refinements::new();
        r.insert(attr("color"), "red");
        r.insert(attr("color"), "blue");
        let before = r.clone();

        assert_eq!(r.toggle(attr("color"), "red"), Toggle::Removed);
        assert_eq!(r.toggle(attr("color"), "red"), Toggle::Added);
        assert_eq!(r.values(&attr("color")), Some(&["blue".to_string(), "red".to_string()][..]));
        assert_eq!(r, before);
    }

    #[test]
    fn test_equality_ignores_selection_order() {
        let a: Refinements = [
            (attr("color"), "red".to_string()),
            (attr("size"), "M".to_string()),
            (attr("color"), "blue".to_string()),
        ]
        .into_iter()
        .collect();
        let b: Refinements = [
            (attr("size"), "M".to_string()),
            (attr("color"), "blue".to_string()),
            (attr("color"), "red".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(a, b);

        let mut c = b.clone();
        c.remove(&attr("color"), "red");
        assert_ne!(a, c);
    }

    #[test]
    fn test_last_value_removal_drops_attribute() {
        let mut r = Refinements::new();
        r.insert(attr("color"), "red");
        r.insert(attr("color"), "blue");

        assert_eq!(r.remove(&attr("color"), "red"), Some(Toggle::Removed));
        assert!(r.contains_attribute(&attr("color")));
        assert_eq!(r.remove(&attr("color"), "blue"), Some(Toggle::RemovedAttribute));
        assert!(!r.contains_attribute(&attr("color")));
        assert!(r.is_empty());
    }

    #[test]
    fn test_insert_is_set_like() {
        let mut r = Refinements::new();
        assert!(r.insert(attr("color"), "red"));
        assert!(!r.insert(attr("color"), "red"));
        assert_eq!(r.value_count(), 1);
    }

    #[test]
    fn test_remove_unknown_value() {
        let mut r = Refinements::new();
        r.insert(attr("color"), "red");
        assert_eq!(r.remove(&attr("color"), "green"), None);
        assert_eq!(r.remove(&attr("size"), "M"), None);
    }

    #[test]
    fn test_iteration_keeps_selection_order() {
        let r: Refinements = vec![
            (attr("size"), "M".to_string()),
            (attr("color"), "red".to_string()),
            (attr("size"), "L".to_string()),
        ]
        .into_iter()
        .collect();

        let flat: Vec<(String, Vec<String>)> = r
            .iter()
            .map(|(a, v)| (a.to_string(), v.to_vec()))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("size".to_string(), vec!["M".to_string(), "L".to_string()]),
                ("color".to_string(), vec!["red".to_string()]),
            ]
        );
    }

    #[test]
    fn test_scope_clamps_limit() {
        assert_eq!(SearchScope::new(0, "en-US", "USD").limit, 1);
        assert_eq!(SearchScope::new(1000, "en-US", "USD").limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_blank_query_is_none() {
        let scope = SearchScope::new(25, "en-US", "USD");
        assert_eq!(SearchParameters::new(&scope).with_query("   ").query, None);
    }

    #[test]
    fn test_at_offset_keeps_everything_else() {
        let scope = SearchScope::new(25, "en-US", "USD");
        let params = SearchParameters::new(&scope)
            .with_query("shoes")
            .with_refinement("color", "red");
        let next = params.at_offset(25);
        assert_eq!(next.offset, 25);
        assert_eq!(next.state(), params.state());
    }
}
