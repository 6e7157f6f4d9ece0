//! Pagination sequencing for a single query.
//!
//! The sequencer decides which offset to load next, tracks per-offset
//! status and merges loaded pages into one deduplicated sequence. It does no
//! I/O: callers ask it for an offset, fetch, then report back with
//! [`PaginationSequencer::complete`].

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::SearchError;
use crate::key::QuerySignature;
use crate::page::{ProductSummary, RefinementDefinition, SearchResultPage, SortOption};

/// Status of one page offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Loading,
    Loaded,
    Failed(SearchError),
}

/// The most recent transition of the sequencer as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading(u32),
    Loaded(u32),
    Failed(u32),
}

/// Page bookkeeping for the current query signature.
#[derive(Debug, Clone)]
pub struct PaginationSequencer {
    signature: Option<QuerySignature>,
    limit: u32,
    pages: BTreeMap<u32, Arc<SearchResultPage>>,
    states: BTreeMap<u32, PageState>,
    phase: Phase,
    last_loaded: Option<u32>,
}

impl PaginationSequencer {
    /// Create an idle sequencer paging by `limit`.
    pub fn new(limit: u32) -> Self {
        Self {
            signature: None,
            limit: limit.max(1),
            pages: BTreeMap::new(),
            states: BTreeMap::new(),
            phase: Phase::Idle,
            last_loaded: None,
        }
    }

    /// Discard everything and start over for `signature`.
    pub fn reset(&mut self, signature: QuerySignature) {
        debug!(signature = %signature, "pagination reset");
        self.signature = Some(signature);
        self.pages.clear();
        self.states.clear();
        self.phase = Phase::Idle;
        self.last_loaded = None;
    }

    pub fn signature(&self) -> Option<&QuerySignature> {
        self.signature.as_ref()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Start loading the page after the highest loaded one.
    ///
    /// Returns the offset to fetch, or `None` when results are exhausted or
    /// that page is already loading.
    pub fn load_next(&mut self) -> Option<u32> {
        let target = match self.pages.last_key_value() {
            None => 0,
            Some((_, page)) if page.is_last() => return None,
            Some((offset, _)) => offset.saturating_add(self.limit),
        };
        self.begin(target)
    }

    /// Start loading the page before the lowest loaded one.
    pub fn load_previous(&mut self) -> Option<u32> {
        let (&lowest, _) = self.pages.first_key_value()?;
        if lowest == 0 {
            return None;
        }
        self.begin(lowest.saturating_sub(self.limit))
    }

    /// Start loading an arbitrary offset.
    pub fn load_page(&mut self, offset: u32) -> Option<u32> {
        self.begin(offset)
    }

    /// Move the lowest failed offset back to loading.
    pub fn retry_failed(&mut self) -> Option<u32> {
        let offset = self
            .states
            .iter()
            .find(|(_, state)| matches!(state, PageState::Failed(_)))
            .map(|(offset, _)| *offset)?;
        self.begin(offset)
    }

    fn begin(&mut self, offset: u32) -> Option<u32> {
        match self.states.get(&offset) {
            Some(PageState::Loading) | Some(PageState::Loaded) => None,
            _ => {
                self.states.insert(offset, PageState::Loading);
                self.phase = Phase::Loading(offset);
                Some(offset)
            }
        }
    }

    /// Record the outcome of a fetch started for `signature` at `offset`.
    ///
    /// Returns [`SearchError::Stale`] without touching any state when the
    /// signature is no longer current or the offset is not loading.
    pub fn complete(
        &mut self,
        signature: &QuerySignature,
        offset: u32,
        result: Result<Arc<SearchResultPage>, SearchError>,
    ) -> Result<(), SearchError> {
        if self.signature.as_ref() != Some(signature)
            || self.states.get(&offset) != Some(&PageState::Loading)
        {
            debug!(offset, "discarding stale page");
            return Err(SearchError::Stale);
        }

        match result {
            Ok(page) => {
                self.pages.insert(offset, page);
                self.states.insert(offset, PageState::Loaded);
                self.phase = Phase::Loaded(offset);
                self.last_loaded = Some(offset);
                Ok(())
            }
            Err(SearchError::Stale) => {
                self.states.remove(&offset);
                Err(SearchError::Stale)
            }
            Err(err) => {
                self.states.insert(offset, PageState::Failed(err.clone()));
                self.phase = Phase::Failed(offset);
                Err(err)
            }
        }
    }

    /// Loaded items in offset order, first occurrence of each id kept.
    pub fn items(&self) -> Vec<ProductSummary> {
        let mut seen = HashSet::new();
        self.pages
            .values()
            .flat_map(|page| page.items.iter())
            .filter(|item| seen.insert(item.id.clone()))
            .cloned()
            .collect()
    }

    /// Offsets that have a loaded page.
    pub fn loaded_offsets(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    pub fn page(&self, offset: u32) -> Option<&Arc<SearchResultPage>> {
        self.pages.get(&offset)
    }

    pub fn state(&self, offset: u32) -> Option<&PageState> {
        self.states.get(&offset)
    }

    /// Offsets currently loading.
    pub fn loading(&self) -> Vec<u32> {
        self.states
            .iter()
            .filter(|(_, state)| **state == PageState::Loading)
            .map(|(offset, _)| *offset)
            .collect()
    }

    /// Errors keyed by the offset they occurred at.
    pub fn errors(&self) -> Vec<(u32, SearchError)> {
        self.states
            .iter()
            .filter_map(|(offset, state)| match state {
                PageState::Failed(err) => Some((*offset, err.clone())),
                _ => None,
            })
            .collect()
    }

    /// Total reported by the highest loaded page.
    pub fn total(&self) -> Option<u32> {
        self.pages.values().next_back().map(|page| page.total)
    }

    /// Items not yet covered by the highest loaded page.
    pub fn remaining(&self) -> Option<u32> {
        self.pages
            .values()
            .next_back()
            .map(|page| page.total.saturating_sub(page.end()))
    }

    pub fn has_more(&self) -> bool {
        match self.pages.values().next_back() {
            Some(page) => !page.is_last(),
            None => true,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.pages.keys().next().is_some_and(|offset| *offset > 0)
    }

    /// Refinements offered by the most recently loaded page.
    pub fn refinements(&self) -> &[RefinementDefinition] {
        self.latest_page()
            .map(|page| page.refinements.as_slice())
            .unwrap_or(&[])
    }

    /// Sort options offered by the most recently loaded page.
    pub fn sorting_options(&self) -> &[SortOption] {
        self.latest_page()
            .map(|page| page.sorting_options.as_slice())
            .unwrap_or(&[])
    }

    fn latest_page(&self) -> Option<&Arc<SearchResultPage>> {
        self.last_loaded.and_then(|offset| self.pages.get(&offset))
    }
}
