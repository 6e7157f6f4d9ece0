//! Search session orchestration.
//!
//! A [`SearchSession`] ties the refinement store, pagination sequencer and
//! result cache to a [`CatalogFetcher`]. It is a cheap, cloneable handle:
//! mutations are synchronous, loads are async and never hold the state lock
//! across an await.
//!
//! Last request wins. Every mutation aborts loads in flight, drops cached
//! pages of the previous query and resets pagination; a response that still
//! arrives for an older query is discarded as [`SearchError::Stale`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use tracing::{debug, info, warn};

use crate::cache::{CacheStatus, ResultCache};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::fetcher::CatalogFetcher;
use crate::ids::{AttributeId, SortId};
use crate::key::{QueryKey, QuerySignature};
use crate::page::{ProductSummary, SearchResultPage};
use crate::params::{SearchParameters, SearchScope, SearchState};
use crate::presentation::{self, FilterPresentation};
use crate::refinement::{Commit, Mutation, RefinementStore};
use crate::retry::RetryPolicy;
use crate::sequencer::{PaginationSequencer, Phase};
use crate::suggestions::{SearchSuggestions, SuggestionKey, SuggestionParams, DEFAULT_MIN_CHARS};

/// Result of a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page at `offset` is now part of the sequence.
    Loaded { offset: u32, status: CacheStatus },
    /// Nothing to do: end of results, already at the start, or already loading.
    Skipped,
}

/// Everything a results screen needs to render.
#[derive(Debug, Clone)]
pub struct SearchSnapshot {
    pub parameters: SearchState,
    pub revision: u64,
    /// Accumulated items in offset order, deduplicated.
    pub items: Vec<ProductSummary>,
    pub total: Option<u32>,
    pub remaining: Option<u32>,
    pub loaded_offsets: Vec<u32>,
    pub loading: Vec<u32>,
    /// Failures keyed by the offset they belong to.
    pub errors: Vec<(u32, SearchError)>,
    pub phase: Phase,
    pub has_more: bool,
    pub has_previous: bool,
    pub filters: FilterPresentation,
}

struct SessionState {
    store: RefinementStore,
    sequencer: PaginationSequencer,
    inflight: HashMap<u32, (u64, AbortHandle)>,
}

struct Inner {
    fetcher: Arc<dyn CatalogFetcher>,
    scope: SearchScope,
    retry: RetryPolicy,
    suggestion_min_chars: usize,
    suggestion_limit: Option<u32>,
    pages: ResultCache<QueryKey, SearchResultPage>,
    suggestions: ResultCache<SuggestionKey, SearchSuggestions>,
    state: Mutex<SessionState>,
    next_load: AtomicU64,
}

struct PendingLoad {
    id: u64,
    offset: u32,
    signature: QuerySignature,
    registration: AbortRegistration,
    params: SearchParameters,
}

/// Handle to one user's search.
#[derive(Clone)]
pub struct SearchSession {
    inner: Arc<Inner>,
}

/// Builder for [`SearchSession`].
pub struct SessionBuilder {
    fetcher: Arc<dyn CatalogFetcher>,
    scope: SearchScope,
    retry: RetryPolicy,
    suggestion_min_chars: usize,
    suggestion_limit: Option<u32>,
    initial: SearchState,
}

impl SessionBuilder {
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Suggestion gating and size.
    pub fn suggestions(mut self, min_chars: usize, limit: Option<u32>) -> Self {
        self.suggestion_min_chars = min_chars;
        self.suggestion_limit = limit;
        self
    }

    /// Start from existing parameters, e.g. a deep link.
    pub fn initial_state(mut self, state: SearchState) -> Self {
        self.initial = state;
        self
    }

    pub fn build(self) -> SearchSession {
        let mut sequencer = PaginationSequencer::new(self.scope.limit);
        sequencer.reset(QuerySignature::of(&self.initial.to_parameters(&self.scope, 0)));

        SearchSession {
            inner: Arc::new(Inner {
                fetcher: self.fetcher,
                scope: self.scope,
                retry: self.retry,
                suggestion_min_chars: self.suggestion_min_chars,
                suggestion_limit: self.suggestion_limit,
                pages: ResultCache::new(),
                suggestions: ResultCache::new(),
                state: Mutex::new(SessionState {
                    store: RefinementStore::with_state(self.initial),
                    sequencer,
                    inflight: HashMap::new(),
                }),
                next_load: AtomicU64::new(1),
            }),
        }
    }
}

impl SearchSession {
    pub fn builder(fetcher: Arc<dyn CatalogFetcher>, scope: SearchScope) -> SessionBuilder {
        SessionBuilder {
            fetcher,
            scope,
            retry: RetryPolicy::default(),
            suggestion_min_chars: DEFAULT_MIN_CHARS,
            suggestion_limit: None,
            initial: SearchState::default(),
        }
    }

    /// Session with default retry and suggestion settings.
    pub fn new(fetcher: Arc<dyn CatalogFetcher>, scope: SearchScope) -> Self {
        Self::builder(fetcher, scope).build()
    }

    /// Builder preloaded with the scope, retry and suggestion settings of `config`.
    pub fn configured(config: &SearchConfig, fetcher: Arc<dyn CatalogFetcher>) -> SessionBuilder {
        Self::builder(fetcher, config.scope())
            .retry(config.retry_policy())
            .suggestions(config.suggestion_min_chars, Some(config.suggestion_limit))
    }

    /// Session configured from `config`.
    pub fn from_config(config: &SearchConfig, fetcher: Arc<dyn CatalogFetcher>) -> Self {
        Self::configured(config, fetcher).build()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn scope(&self) -> &SearchScope {
        &self.inner.scope
    }

    /// Current parameters, without pagination fields.
    pub fn parameters(&self) -> SearchState {
        self.lock().store.parameters().clone()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let st = self.lock();
        SearchSnapshot {
            parameters: st.store.parameters().clone(),
            revision: st.store.revision(),
            items: st.sequencer.items(),
            total: st.sequencer.total(),
            remaining: st.sequencer.remaining(),
            loaded_offsets: st.sequencer.loaded_offsets(),
            loading: st.sequencer.loading(),
            errors: st.sequencer.errors(),
            phase: st.sequencer.phase(),
            has_more: st.sequencer.has_more(),
            has_previous: st.sequencer.has_previous(),
            filters: presentation::present(
                st.store.parameters(),
                st.sequencer.refinements(),
                st.sequencer.sorting_options(),
            ),
        }
    }

    pub fn presentation(&self) -> FilterPresentation {
        let st = self.lock();
        presentation::present(
            st.store.parameters(),
            st.sequencer.refinements(),
            st.sequencer.sorting_options(),
        )
    }

    // Mutations

    pub fn toggle_refinement(
        &self,
        attribute: impl Into<AttributeId>,
        value: impl Into<String>,
    ) -> Commit {
        let mut st = self.lock();
        let commit = st.store.toggle_refinement(attribute, value);
        self.apply(&mut st, &commit);
        commit
    }

    pub fn set_sort(&self, sort: impl Into<SortId>) -> Commit {
        let mut st = self.lock();
        let commit = st.store.set_sort(sort);
        self.apply(&mut st, &commit);
        commit
    }

    pub fn set_query(&self, query: Option<&str>) -> Option<Commit> {
        let mut st = self.lock();
        let commit = st.store.set_query(query)?;
        self.apply(&mut st, &commit);
        Some(commit)
    }

    pub fn clear_all(&self) -> Option<Commit> {
        let mut st = self.lock();
        let commit = st.store.clear_all()?;
        self.apply(&mut st, &commit);
        Some(commit)
    }

    fn apply(&self, st: &mut SessionState, commit: &Commit) {
        for (offset, (_, handle)) in st.inflight.drain() {
            debug!(offset, "aborting superseded load");
            handle.abort();
        }

        let old = QuerySignature::of(&commit.previous.to_parameters(&self.inner.scope, 0));
        let removed = match commit.mutation {
            // Another search term; its pages stay valid for when the shopper comes back.
            Mutation::Query(_) => {
                self.inner.pages.abandon_inflight(|key| key.matches(&old));
                0
            }
            _ => self.inner.pages.invalidate(|key| key.matches(&old)),
        };

        let current = QuerySignature::of(&st.store.parameters().to_parameters(&self.inner.scope, 0));
        st.sequencer.reset(current);

        info!(revision = commit.revision, removed, mutation = ?commit.mutation, "search parameters changed");
    }

    // Loads

    /// Load the page after the last loaded one (offset 0 after a reset).
    pub async fn load_next(&self) -> Result<LoadOutcome, SearchError> {
        let pending = {
            let mut st = self.lock();
            st.sequencer.load_next().map(|offset| self.begin(&mut st, offset))
        };
        self.run(pending).await
    }

    /// Load the page before the first loaded one.
    pub async fn load_previous(&self) -> Result<LoadOutcome, SearchError> {
        let pending = {
            let mut st = self.lock();
            st.sequencer.load_previous().map(|offset| self.begin(&mut st, offset))
        };
        self.run(pending).await
    }

    /// Load an explicit offset, e.g. when restoring a scroll position.
    pub async fn load_page(&self, offset: u32) -> Result<LoadOutcome, SearchError> {
        let pending = {
            let mut st = self.lock();
            st.sequencer.load_page(offset).map(|offset| self.begin(&mut st, offset))
        };
        self.run(pending).await
    }

    /// Retry the lowest failed offset, keeping pages already loaded.
    pub async fn retry_failed(&self) -> Result<LoadOutcome, SearchError> {
        let pending = {
            let mut st = self.lock();
            st.sequencer.retry_failed().map(|offset| self.begin(&mut st, offset))
        };
        self.run(pending).await
    }

    fn begin(&self, st: &mut SessionState, offset: u32) -> PendingLoad {
        let params = st.store.parameters().to_parameters(&self.inner.scope, offset);
        let signature = QuerySignature::of(&params);
        let (handle, registration) = AbortHandle::new_pair();
        let id = self.inner.next_load.fetch_add(1, Ordering::Relaxed);
        st.inflight.insert(offset, (id, handle));
        debug!(offset, key = %signature, "page load started");
        PendingLoad {
            id,
            offset,
            signature,
            registration,
            params,
        }
    }

    async fn run(&self, pending: Option<PendingLoad>) -> Result<LoadOutcome, SearchError> {
        let Some(load) = pending else {
            return Ok(LoadOutcome::Skipped);
        };

        let key = QueryKey::new(load.signature.clone(), load.offset);
        let fetcher = Arc::clone(&self.inner.fetcher);
        let retry = self.inner.retry.clone();
        let params = load.params;
        let fetch = self.inner.pages.get_or_fetch(key, move || async move {
            retry.run(|| fetcher.fetch(&params)).await
        });

        let result = match Abortable::new(fetch, load.registration).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Stale),
        };

        let mut st = self.lock();
        if st
            .inflight
            .get(&load.offset)
            .is_some_and(|(id, _)| *id == load.id)
        {
            st.inflight.remove(&load.offset);
        }

        let status = result.as_ref().map(|(_, status)| *status).ok();
        match st
            .sequencer
            .complete(&load.signature, load.offset, result.map(|(page, _)| page))
        {
            Ok(()) => {
                let status = status.unwrap_or(CacheStatus::Miss);
                debug!(offset = load.offset, %status, "page loaded");
                Ok(LoadOutcome::Loaded {
                    offset: load.offset,
                    status,
                })
            }
            Err(SearchError::Stale) => {
                debug!(offset = load.offset, "response discarded as stale");
                Err(SearchError::Stale)
            }
            Err(err) => {
                warn!(offset = load.offset, error = %err, "page load failed");
                Err(err)
            }
        }
    }

    // Suggestions

    /// Suggestions for `q`, or `None` when the query is too short.
    pub async fn suggest(&self, q: &str) -> Result<Option<Arc<SearchSuggestions>>, SearchError> {
        let mut params = SuggestionParams::new(q, &self.inner.scope.currency, &self.inner.scope.locale);
        if let Some(limit) = self.inner.suggestion_limit {
            params = params.with_limit(limit);
        }
        if !params.is_enabled(self.inner.suggestion_min_chars) {
            debug!(q, "query too short for suggestions");
            return Ok(None);
        }

        let fetcher = Arc::clone(&self.inner.fetcher);
        let retry = self.inner.retry.clone();
        let key = params.key();
        let (suggestions, _) = self
            .inner
            .suggestions
            .get_or_fetch(key, move || async move {
                retry.run(|| fetcher.fetch_suggestions(&params)).await
            })
            .await?;
        Ok(Some(suggestions))
    }
}

impl std::fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("scope", &self.inner.scope)
            .field("pages", &self.inner.pages)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogFetcher for CountingFetcher {
        async fn fetch(&self, params: &SearchParameters) -> Result<SearchResultPage, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SearchResultPage {
                items: (params.offset..params.offset + params.limit)
                    .map(|i| ProductSummary::new(format!("p{}", i), "Product"))
                    .collect(),
                total: 100,
                offset: params.offset,
                limit: params.limit,
                refinements: Vec::new(),
                sorting_options: Vec::new(),
            })
        }

        async fn fetch_suggestions(
            &self,
            params: &SuggestionParams,
        ) -> Result<SearchSuggestions, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SearchSuggestions {
                search_phrase: params.q.clone(),
                ..SearchSuggestions::default()
            })
        }
    }

    fn session() -> (SearchSession, Arc<CountingFetcher>) {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let session = SearchSession::new(fetcher.clone(), SearchScope::new(25, "en-US", "USD"));
        (session, fetcher)
    }

    #[tokio::test]
    async fn test_mutation_resets_to_first_page() {
        let (session, _) = session();
        session.load_next().await.unwrap();
        session.load_next().await.unwrap();
        assert_eq!(session.snapshot().loaded_offsets, vec![0, 25]);

        session.toggle_refinement("c_color", "red");
        let snapshot = session.snapshot();
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.phase, Phase::Idle);

        let outcome = session.load_next().await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                offset: 0,
                status: CacheStatus::Miss
            }
        );
    }

    #[tokio::test]
    async fn test_noop_mutations_keep_pages() {
        let (session, _) = session();
        session.load_next().await.unwrap();
        assert!(session.clear_all().is_none());
        assert!(session.set_query(None).is_none());
        assert_eq!(session.snapshot().items.len(), 25);
    }

    #[tokio::test]
    async fn test_returning_to_previous_term_hits_cache() {
        let (session, fetcher) = session();
        session.set_query(Some("shoes"));
        session.load_next().await.unwrap();
        session.set_query(Some("boots"));
        session.load_next().await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

        session.set_query(Some("shoes"));
        let outcome = session.load_next().await.unwrap();

        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                offset: 0,
                status: CacheStatus::Hit
            }
        );
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.snapshot().items.len(), 25);
    }

    #[tokio::test]
    async fn test_refinement_change_invalidates_outgoing_pages() {
        let (session, fetcher) = session();
        session.set_query(Some("shoes"));
        session.load_next().await.unwrap();

        session.toggle_refinement("c_color", "red");
        session.toggle_refinement("c_color", "red");
        let outcome = session.load_next().await.unwrap();

        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                offset: 0,
                status: CacheStatus::Miss
            }
        );
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_suggestions_are_gated_and_cached() {
        let (session, fetcher) = session();
        assert!(session.suggest("sh").await.unwrap().is_none());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);

        let first = session.suggest("sho").await.unwrap().unwrap();
        let second = session.suggest("SHO ").await.unwrap().unwrap();
        assert_eq!(first.search_phrase, "sho");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
