//! Type-ahead search suggestions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::ids::{CategoryId, ProductId};

/// Minimum query length before suggestions are requested.
pub const DEFAULT_MIN_CHARS: usize = 3;

/// Parameters of a suggestion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionParams {
    pub q: String,
    pub limit: Option<u32>,
    pub currency: String,
    pub locale: String,
}

impl SuggestionParams {
    pub fn new(q: impl Into<String>, currency: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            limit: None,
            currency: currency.into(),
            locale: locale.into(),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether the query is long enough to be worth a request.
    pub fn is_enabled(&self, min_chars: usize) -> bool {
        self.q.trim().chars().count() >= min_chars
    }

    /// Canonical cache key for this request.
    pub fn key(&self) -> SuggestionKey {
        SuggestionKey(format!(
            "{}|{}|{}|{}",
            self.q.trim().to_lowercase(),
            self.limit.map(|l| l.to_string()).unwrap_or_default(),
            self.currency,
            self.locale
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuggestionKey(String);

impl fmt::Display for SuggestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSuggestion {
    pub id: ProductId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedPhrase {
    pub phrase: String,
    pub exact: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySuggestion {
    pub id: CategoryId,
    pub name: String,
}

/// Suggestions returned for a partial query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchSuggestions {
    pub search_phrase: String,
    pub products: Vec<ProductSuggestion>,
    pub phrases: Vec<SuggestedPhrase>,
    pub categories: Vec<CategorySuggestion>,
}

impl SearchSuggestions {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.phrases.is_empty() && self.categories.is_empty()
    }

    /// Parse a backend suggestion response body.
    pub fn from_json(body: &str) -> Result<Self, SearchError> {
        let raw: RawSuggestions = serde_json::from_str(body)?;
        let mut phrases: Vec<SuggestedPhrase> = Vec::new();

        let products = match raw.product_suggestions {
            Some(section) => {
                push_phrases(&mut phrases, section.suggested_phrases);
                section
                    .products
                    .into_iter()
                    .map(|p| ProductSuggestion {
                        name: p.product_name.unwrap_or_else(|| p.product_id.clone()),
                        id: ProductId::new(p.product_id),
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        let categories = match raw.category_suggestions {
            Some(section) => {
                push_phrases(&mut phrases, section.suggested_phrases);
                section
                    .categories
                    .into_iter()
                    .map(|c| CategorySuggestion {
                        name: c.name.unwrap_or_else(|| c.id.clone()),
                        id: CategoryId::new(c.id),
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        Ok(Self {
            search_phrase: raw.search_phrase,
            products,
            phrases,
            categories,
        })
    }
}

fn push_phrases(out: &mut Vec<SuggestedPhrase>, raw: Vec<RawPhrase>) {
    for p in raw {
        if !out.iter().any(|existing| existing.phrase == p.phrase) {
            out.push(SuggestedPhrase {
                phrase: p.phrase,
                exact: p.exact_match,
            });
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSuggestions {
    #[serde(default)]
    search_phrase: String,
    product_suggestions: Option<RawProductSection>,
    category_suggestions: Option<RawCategorySection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProductSection {
    #[serde(default)]
    products: Vec<RawProduct>,
    #[serde(default)]
    suggested_phrases: Vec<RawPhrase>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCategorySection {
    #[serde(default)]
    categories: Vec<RawCategory>,
    #[serde(default)]
    suggested_phrases: Vec<RawPhrase>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProduct {
    product_id: String,
    product_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    id: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPhrase {
    phrase: String,
    #[serde(default)]
    exact_match: bool,
}
