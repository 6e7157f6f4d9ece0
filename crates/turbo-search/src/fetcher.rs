//! Catalog backend access.
//!
//! A [`CatalogFetcher`] performs exactly one round trip per call and never
//! retries; retry and staleness handling live in the session.

use async_trait::async_trait;
use tracing::debug;
use turbo_data::FetchClient;

use crate::error::SearchError;
use crate::page::SearchResultPage;
use crate::params::SearchParameters;
use crate::suggestions::{SearchSuggestions, SuggestionParams};

/// Source of result pages and suggestions.
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Fetch one page of results for `params`.
    async fn fetch(&self, params: &SearchParameters) -> Result<SearchResultPage, SearchError>;

    /// Fetch type-ahead suggestions.
    async fn fetch_suggestions(
        &self,
        params: &SuggestionParams,
    ) -> Result<SearchSuggestions, SearchError>;
}

/// Fetcher talking to a shopper-search shaped HTTP API.
#[derive(Debug, Clone)]
pub struct HttpCatalogFetcher {
    client: FetchClient,
    organization_id: String,
    site_id: String,
    access_token: Option<String>,
}

impl HttpCatalogFetcher {
    /// `client` should already carry the backend base URL.
    pub fn new(
        client: FetchClient,
        organization_id: impl Into<String>,
        site_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            organization_id: organization_id.into(),
            site_id: site_id.into(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn path(&self, resource: &str) -> String {
        format!(
            "/search/shopper-search/v1/organizations/{}/{}",
            self.organization_id, resource
        )
    }

    async fn get(&self, resource: &str, pairs: Vec<(String, String)>) -> Result<String, SearchError> {
        let mut request = self
            .client
            .get(self.path(resource))
            .query("siteId", self.site_id.clone())
            .query_pairs(pairs);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.text()?)
    }
}

#[async_trait]
impl CatalogFetcher for HttpCatalogFetcher {
    async fn fetch(&self, params: &SearchParameters) -> Result<SearchResultPage, SearchError> {
        debug!(offset = params.offset, limit = params.limit, "fetching product search page");
        let body = self.get("product-search", encode_search_query(params)).await?;
        SearchResultPage::from_json(&body, &params.currency)
    }

    async fn fetch_suggestions(
        &self,
        params: &SuggestionParams,
    ) -> Result<SearchSuggestions, SearchError> {
        debug!(q = %params.q, "fetching search suggestions");
        let body = self
            .get("search-suggestions", encode_suggestion_query(params))
            .await?;
        SearchSuggestions::from_json(&body)
    }
}

/// Query string pairs for a product search.
///
/// Each refined attribute becomes one `refine=attr=v1|v2` pair.
pub fn encode_search_query(params: &SearchParameters) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(q) = &params.query {
        pairs.push(("q".to_string(), q.clone()));
    }
    if let Some(sort) = &params.sort {
        pairs.push(("sort".to_string(), sort.to_string()));
    }
    for (attribute, values) in params.refinements.iter() {
        pairs.push(("refine".to_string(), format!("{}={}", attribute, values.join("|"))));
    }
    pairs.push(("offset".to_string(), params.offset.to_string()));
    pairs.push(("limit".to_string(), params.limit.to_string()));
    pairs.push(("currency".to_string(), params.currency.clone()));
    pairs.push(("locale".to_string(), params.locale.clone()));

    let options = &params.options;
    if !options.expand.is_empty() {
        pairs.push(("expand".to_string(), options.expand.join(",")));
    }
    if let Some(select) = &options.select {
        pairs.push(("select".to_string(), select.clone()));
    }
    for (flag, set) in [
        ("allImages", options.all_images),
        ("perPricebook", options.per_pricebook),
        ("allVariationProperties", options.all_variation_properties),
    ] {
        if set {
            pairs.push((flag.to_string(), "true".to_string()));
        }
    }
    pairs
}

/// Query string pairs for a suggestion request.
pub fn encode_suggestion_query(params: &SuggestionParams) -> Vec<(String, String)> {
    let mut pairs = vec![("q".to_string(), params.q.trim().to_string())];
    if let Some(limit) = params.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs.push(("currency".to_string(), params.currency.clone()));
    pairs.push(("locale".to_string(), params.locale.clone()));
    pairs
}
