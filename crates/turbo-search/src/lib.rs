//! Faceted catalog search for the TurboCommerce storefront client.
//!
//! Turns a mutable set of search parameters (free-text query, sort order,
//! multi-valued attribute refinements, pagination cursor) into a merged,
//! cache-coherent, incrementally loadable result sequence.
//!
//! - **Refinements**: [`RefinementStore`] owns the user's selection
//! - **Keys**: [`QueryKey`] / [`QuerySignature`] give canonical cache identity
//! - **Fetching**: [`CatalogFetcher`] and its HTTP implementation
//! - **Pagination**: [`PaginationSequencer`] merges pages per query
//! - **Caching**: [`ResultCache`] with in-flight request sharing
//! - **Presentation**: selected flags, filter chips and effective sort
//! - **Session**: [`SearchSession`] wires it together, last request wins
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turbo_search::prelude::*;
//!
//! let config = SearchConfig::load("turbo.toml")?;
//! let session = SearchSession::from_config(&config, Arc::new(config.http_fetcher()));
//!
//! session.set_query(Some("shoes"));
//! session.load_next().await?;
//!
//! session.toggle_refinement("c_refinementColor", "red");
//! session.load_next().await?;
//!
//! for chip in session.presentation().chips {
//!     println!("{} x", chip.label);
//! }
//! ```

pub mod access;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod ids;
pub mod key;
pub mod money;
pub mod page;
pub mod params;
pub mod presentation;
pub mod refinement;
pub mod retry;
pub mod sequencer;
pub mod session;
pub mod suggestions;

pub use cache::{CacheStatus, ResultCache};
pub use config::SearchConfig;
pub use error::{ConfigError, SearchError};
pub use fetcher::{CatalogFetcher, HttpCatalogFetcher};
pub use ids::*;
pub use key::{QueryKey, QuerySignature};
pub use money::{Currency, Money};
pub use page::{ProductSummary, RefinementDefinition, RefinementValue, SearchResultPage, SortOption};
pub use params::{Refinements, RequestOptions, SearchParameters, SearchScope, SearchState};
pub use refinement::{Commit, Mutation, RefinementStore};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use sequencer::{PaginationSequencer, Phase};
pub use session::{LoadOutcome, SearchSession, SearchSnapshot};
pub use suggestions::{SearchSuggestions, SuggestionParams};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{ConfigError, SearchError};
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    pub use crate::config::SearchConfig;
    pub use crate::fetcher::{CatalogFetcher, HttpCatalogFetcher};
    pub use crate::page::{ProductSummary, SearchResultPage};
    pub use crate::params::{SearchParameters, SearchScope, SearchState};
    pub use crate::presentation::FilterPresentation;
    pub use crate::session::{LoadOutcome, SearchSession, SearchSnapshot};
}
