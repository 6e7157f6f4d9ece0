//! Result pages and the backend payload they are normalized from.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::ids::{AttributeId, ProductId, SortId};
use crate::money::{Currency, Money};

/// A product as shown in the result grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    /// Image URL, if the backend returned one.
    pub image: Option<String>,
    pub price: Option<Money>,
}

impl ProductSummary {
    /// Create a summary without image or price.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: None,
            price: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    /// Price text for display; `0.00` when no price is known.
    pub fn display_price(&self) -> String {
        match &self.price {
            Some(price) => price.display(),
            None => "0.00".to_string(),
        }
    }
}

/// One selectable value of a refinement attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementValue {
    pub value: String,
    pub label: String,
    /// Informational only; never used for selection logic.
    pub hit_count: u64,
}

/// An attribute the backend offers for refinement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementDefinition {
    pub attribute_id: AttributeId,
    pub label: String,
    pub values: Vec<RefinementValue>,
}

impl RefinementDefinition {
    /// Display label for `value`, if the backend listed it.
    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.value == value)
            .map(|v| v.label.as_str())
    }
}

/// A sort rule offered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    pub id: SortId,
    pub label: String,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultPage {
    pub items: Vec<ProductSummary>,
    /// Total matching items for the query; may drift between pages.
    pub total: u32,
    pub offset: u32,
    pub limit: u32,
    pub refinements: Vec<RefinementDefinition>,
    pub sorting_options: Vec<SortOption>,
}

impl SearchResultPage {
    /// An empty page at offset 0.
    pub fn empty(limit: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            offset: 0,
            limit,
            refinements: Vec::new(),
            sorting_options: Vec::new(),
        }
    }

    /// Offset just past the last item on this page.
    pub fn end(&self) -> u32 {
        self.offset.saturating_add(self.items.len() as u32)
    }

    /// True when this page reaches the reported total.
    pub fn is_last(&self) -> bool {
        self.end() >= self.total
    }

    /// Parse and normalize a backend search response body.
    ///
    /// `fallback_currency` prices hits that do not carry their own currency.
    pub fn from_json(body: &str, fallback_currency: &str) -> Result<Self, SearchError> {
        let raw: RawSearchResult = serde_json::from_str(body)?;
        raw.normalize(fallback_currency)
    }
}

// Backend wire format (shopper-search shaped).

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSearchResult {
    limit: u32,
    offset: u32,
    total: u32,
    #[serde(default)]
    hits: Vec<RawHit>,
    #[serde(default)]
    refinements: Vec<RawRefinement>,
    #[serde(default)]
    sorting_options: Vec<RawSortOption>,
}

impl RawSearchResult {
    pub(crate) fn normalize(self, fallback_currency: &str) -> Result<SearchResultPage, SearchError> {
        let items = self
            .hits
            .into_iter()
            .enumerate()
            .map(|(i, hit)| {
                hit.normalize(fallback_currency)
                    .ok_or_else(|| SearchError::malformed(format!("hit {} has no product id", i)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SearchResultPage {
            items,
            total: self.total,
            offset: self.offset,
            limit: self.limit,
            refinements: self
                .refinements
                .into_iter()
                .map(RawRefinement::normalize)
                .collect(),
            sorting_options: self
                .sorting_options
                .into_iter()
                .map(|s| SortOption {
                    label: s.label.unwrap_or_else(|| s.id.clone()),
                    id: SortId::new(s.id),
                })
                .collect(),
        })
    }
}

/// A hit as either a search hit or a full product document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawHit {
    product_id: Option<String>,
    product_name: Option<String>,
    id: Option<String>,
    name: Option<String>,
    image: Option<RawImage>,
    #[serde(default)]
    image_groups: Vec<RawImageGroup>,
    price: Option<f64>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImage {
    link: Option<String>,
    dis_base_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawImageGroup {
    #[serde(default)]
    images: Vec<RawImage>,
}

impl RawHit {
    fn normalize(self, fallback_currency: &str) -> Option<ProductSummary> {
        let id = non_empty(self.product_id).or_else(|| non_empty(self.id))?;
        let name = non_empty(self.product_name)
            .or_else(|| non_empty(self.name))
            .unwrap_or_else(|| id.clone());

        let image = self
            .image
            .and_then(|img| non_empty(img.link).or_else(|| non_empty(img.dis_base_link)))
            .or_else(|| {
                self.image_groups
                    .into_iter()
                    .next()
                    .and_then(|group| group.images.into_iter().next())
                    .and_then(|img| non_empty(img.link))
            });

        let currency = self.currency.as_deref().unwrap_or(fallback_currency);
        let price = match (self.price, Currency::from_code(currency)) {
            (Some(amount), Some(currency)) if amount.is_finite() => {
                Some(Money::from_decimal(amount, currency))
            }
            _ => None,
        };

        Some(ProductSummary {
            id: ProductId::new(id),
            name,
            image,
            price,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRefinement {
    attribute_id: String,
    label: Option<String>,
    #[serde(default)]
    values: Vec<RawRefinementValue>,
}

impl RawRefinement {
    fn normalize(self) -> RefinementDefinition {
        RefinementDefinition {
            label: self.label.unwrap_or_else(|| self.attribute_id.clone()),
            attribute_id: AttributeId::new(self.attribute_id),
            values: self
                .values
                .into_iter()
                .map(|v| RefinementValue {
                    label: v.label.unwrap_or_else(|| v.value.clone()),
                    value: v.value,
                    hit_count: v.hit_count,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRefinementValue {
    value: String,
    label: Option<String>,
    #[serde(default)]
    hit_count: u64,
}

#[derive(Debug, Deserialize)]
struct RawSortOption {
    id: String,
    label: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<SearchResultPage, SearchError> {
        SearchResultPage::from_json(&value.to_string(), "USD")
    }

    #[test]
    fn test_parses_search_hits() {
        let page = parse(json!({
            "limit": 25,
            "offset": 0,
            "total": 2,
            "hits": [
                {
                    "productId": "p1",
                    "productName": "Trail Shoe",
                    "image": { "link": "https://img/p1.jpg" },
                    "price": 49.99,
                    "currency": "USD"
                },
                {
                    "productId": "p2",
                    "productName": "Road Shoe",
                    "image": { "disBaseLink": "https://img/p2.jpg" },
                    "price": 60
                }
            ],
            "refinements": [
                {
                    "attributeId": "c_color",
                    "label": "Color",
                    "values": [
                        { "value": "red", "label": "Red", "hitCount": 12 },
                        { "value": "blue", "hitCount": 3 }
                    ]
                }
            ],
            "sortingOptions": [
                { "id": "best-matches", "label": "Best Matches" },
                { "id": "price-low-to-high", "label": "Price Low To High" }
            ]
        }))
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, ProductId::new("p1"));
        assert_eq!(page.items[0].image.as_deref(), Some("https://img/p1.jpg"));
        assert_eq!(page.items[0].display_price(), "$49.99");
        assert_eq!(page.items[1].image.as_deref(), Some("https://img/p2.jpg"));
        assert_eq!(page.items[1].price.map(|p| p.minor_units), Some(6000));

        assert_eq!(page.refinements[0].label_for("red"), Some("Red"));
        assert_eq!(page.refinements[0].label_for("blue"), Some("blue"));
        assert_eq!(page.refinements[0].values[0].hit_count, 12);
        assert_eq!(page.sorting_options[0].id, SortId::new("best-matches"));
        assert!(page.is_last());
    }

    #[test]
    fn test_parses_full_product_documents() {
        let page = parse(json!({
            "limit": 25,
            "offset": 25,
            "total": 100,
            "hits": [{
                "id": "p9",
                "name": "Rain Jacket",
                "imageGroups": [{ "images": [{ "link": "https://img/p9.jpg" }] }],
                "price": 120.5,
                "currency": "EUR"
            }]
        }))
        .unwrap();

        let item = &page.items[0];
        assert_eq!(item.name, "Rain Jacket");
        assert_eq!(item.image.as_deref(), Some("https://img/p9.jpg"));
        assert_eq!(item.price, Some(Money::new(12050, Currency::EUR)));
        assert_eq!(page.end(), 26);
        assert!(!page.is_last());
    }

    #[test]
    fn test_missing_optional_fields_become_none() {
        let page = parse(json!({
            "limit": 25,
            "offset": 0,
            "total": 1,
            "hits": [{ "productId": "p1", "currency": "XYZ", "price": 5.0 }]
        }))
        .unwrap();

        let item = &page.items[0];
        assert_eq!(item.name, "p1");
        assert_eq!(item.image, None);
        assert_eq!(item.price, None);
        assert_eq!(item.display_price(), "0.00");
    }

    #[test]
    fn test_absent_hits_is_empty_page() {
        let page = parse(json!({ "limit": 25, "offset": 0, "total": 0 })).unwrap();
        assert!(page.items.is_empty());
        assert!(page.refinements.is_empty());
    }

    #[test]
    fn test_hit_without_id_is_malformed() {
        let err = parse(json!({
            "limit": 25,
            "offset": 0,
            "total": 1,
            "hits": [{ "productName": "Nameless" }]
        }))
        .unwrap_err();
        assert!(matches!(err, SearchError::MalformedResponse(_)));
    }

    #[test]
    fn test_missing_total_is_malformed() {
        let err = parse(json!({ "limit": 25, "offset": 0, "hits": [] })).unwrap_err();
        assert!(matches!(err, SearchError::MalformedResponse(_)));
    }
}
