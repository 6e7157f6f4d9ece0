//! View model for the filter and sort panel.
//!
//! Everything here is recomputed from scratch from the current search state
//! and the refinement definitions of the latest page.

use serde::Serialize;

use crate::ids::{AttributeId, SortId};
use crate::page::{RefinementDefinition, SortOption};
use crate::params::SearchState;

/// A refinement value with its selection flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueView {
    pub value: String,
    pub label: String,
    pub hit_count: u64,
    pub selected: bool,
}

/// A refinement attribute as shown in the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupView {
    pub attribute_id: AttributeId,
    pub label: String,
    pub values: Vec<ValueView>,
}

impl GroupView {
    pub fn selected_count(&self) -> usize {
        self.values.iter().filter(|v| v.selected).count()
    }
}

/// An active filter, removable by toggling `(attribute_id, value)` again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChip {
    pub attribute_id: AttributeId,
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortView {
    pub id: SortId,
    pub label: String,
    pub selected: bool,
}

/// Render-ready filter state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterPresentation {
    pub groups: Vec<GroupView>,
    /// Active filters in selection order.
    pub chips: Vec<FilterChip>,
    pub sort_options: Vec<SortView>,
    /// Sort in effect: the explicit one, else the backend's first option.
    pub effective_sort: Option<SortId>,
}

impl FilterPresentation {
    pub fn has_active_filters(&self) -> bool {
        !self.chips.is_empty()
    }
}

/// Build the presentation for `state` against the backend's definitions.
pub fn present(
    state: &SearchState,
    definitions: &[RefinementDefinition],
    sort_options: &[SortOption],
) -> FilterPresentation {
    let groups = definitions
        .iter()
        .filter(|def| !def.values.is_empty())
        .map(|def| GroupView {
            attribute_id: def.attribute_id.clone(),
            label: def.label.clone(),
            values: def
                .values
                .iter()
                .map(|v| ValueView {
                    value: v.value.clone(),
                    label: v.label.clone(),
                    hit_count: v.hit_count,
                    selected: state.refinements.contains(&def.attribute_id, &v.value),
                })
                .collect(),
        })
        .collect();

    let chips = state
        .refinements
        .iter()
        .flat_map(|(attribute, values)| {
            values.iter().map(move |value| FilterChip {
                attribute_id: attribute.clone(),
                value: value.clone(),
                label: value_label(definitions, attribute, value),
            })
        })
        .collect();

    let effective = effective_sort(state.sort.as_ref(), sort_options);
    let sort_options = sort_options
        .iter()
        .map(|opt| SortView {
            id: opt.id.clone(),
            label: opt.label.clone(),
            selected: effective.as_ref() == Some(&opt.id),
        })
        .collect();

    FilterPresentation {
        groups,
        chips,
        sort_options,
        effective_sort: effective,
    }
}

/// Explicit sort if set, otherwise the first option the backend offered.
pub fn effective_sort(explicit: Option<&SortId>, options: &[SortOption]) -> Option<SortId> {
    explicit
        .cloned()
        .or_else(|| options.first().map(|opt| opt.id.clone()))
}

/// Display label for a refinement value, falling back to the raw value.
pub fn value_label(definitions: &[RefinementDefinition], attribute: &AttributeId, value: &str) -> String {
    definitions
        .iter()
        .find(|def| &def.attribute_id == attribute)
        .and_then(|def| def.label_for(value))
        .unwrap_or(value)
        .to_string()
}
