//! Canonical cache keys for search queries.
//!
//! Two parameter sets that describe the same query map to the same key
//! regardless of the order refinements were selected in. The key keeps its
//! components around for debugging.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::SearchParameters;

/// Identity of a query independent of pagination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuerySignature {
    key: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    components: Vec<String>,
}

impl QuerySignature {
    /// Compute the signature of `params`, ignoring `offset`.
    pub fn of(params: &SearchParameters) -> Self {
        let mut parts = Vec::new();
        let mut components = Vec::new();

        let query = params.query.as_deref().unwrap_or("");
        parts.push(format!("q={}", escape(query)));
        components.push(format!("query:{}", query));

        if let Some(sort) = &params.sort {
            parts.push(format!("s={}", escape(sort.as_str())));
            components.push(format!("sort:{}", sort));
        }

        let mut refined: Vec<(String, Vec<String>)> = params
            .refinements
            .iter()
            .map(|(attribute, values)| {
                let mut values: Vec<String> = values.iter().map(|v| escape(v)).collect();
                values.sort();
                (escape(attribute.as_str()), values)
            })
            .collect();
        refined.sort();
        for (attribute, values) in refined {
            components.push(format!("refine:{}={}", attribute, values.join(",")));
            parts.push(format!("r:{}={}", attribute, values.join(",")));
        }

        parts.push(format!("l={}", params.limit));
        parts.push(format!("loc={}", escape(&params.locale)));
        parts.push(format!("cur={}", escape(&params.currency)));
        components.push(format!(
            "scope:{}/{}/{}",
            params.limit, params.locale, params.currency
        ));

        let options = &params.options;
        let mut expand: Vec<String> = options.expand.iter().map(|e| escape(e)).collect();
        expand.sort();
        expand.dedup();
        parts.push(format!("x={}", expand.join(",")));
        if let Some(select) = &options.select {
            parts.push(format!("sel={}", escape(select)));
        }
        parts.push(format!(
            "f={}{}{}",
            u8::from(options.all_images),
            u8::from(options.per_pricebook),
            u8::from(options.all_variation_properties)
        ));

        Self {
            key: parts.join("|"),
            components,
        }
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Get the key components (for debugging).
    pub fn components(&self) -> &[String] {
        &self.components
    }
}

impl fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Cache key for one page of one query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    signature: QuerySignature,
    offset: u32,
}

impl QueryKey {
    /// Key for `params` at its own offset.
    pub fn of(params: &SearchParameters) -> Self {
        Self {
            signature: QuerySignature::of(params),
            offset: params.offset,
        }
    }

    /// Key for an already computed signature.
    pub fn new(signature: QuerySignature, offset: u32) -> Self {
        Self { signature, offset }
    }

    /// The offset-independent part of the key.
    pub fn signature(&self) -> &QuerySignature {
        &self.signature
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Whether this key belongs to the query identified by `signature`.
    pub fn matches(&self, signature: &QuerySignature) -> bool {
        &self.signature == signature
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.signature, self.offset)
    }
}

// Backslash-escape separator characters so distinct inputs never collide.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '|' | ',' | '=' | ':') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SearchScope;

    fn scope() -> SearchScope {
        SearchScope::new(25, "en-US", "USD")
    }

    #[test]
    fn test_refinement_order_does_not_matter() {
        let a = SearchParameters::new(&scope())
            .with_query("shoes")
            .with_refinement("color", "red")
            .with_refinement("color", "blue")
            .with_refinement("size", "M");
        let b = SearchParameters::new(&scope())
            .with_query("shoes")
            .with_refinement("size", "M")
            .with_refinement("color", "blue")
            .with_refinement("color", "red");

        assert_eq!(QuerySignature::of(&a), QuerySignature::of(&b));
        assert_eq!(QueryKey::of(&a), QueryKey::of(&b));
    }

    #[test]
    fn test_offset_changes_key_not_signature() {
        let params = SearchParameters::new(&scope()).with_query("shoes");
        let next = params.at_offset(25);

        assert_eq!(QuerySignature::of(&params), QuerySignature::of(&next));
        assert_ne!(QueryKey::of(&params), QueryKey::of(&next));
        assert!(QueryKey::of(&next).matches(&QuerySignature::of(&params)));
    }

    #[test]
    fn test_every_dimension_participates() {
        let base = SearchParameters::new(&scope()).with_query("shoes");
        let sig = QuerySignature::of(&base);

        assert_ne!(sig, QuerySignature::of(&base.clone().with_sort("newest")));
        assert_ne!(
            sig,
            QuerySignature::of(&base.clone().with_refinement("color", "red"))
        );
        assert_ne!(
            sig,
            QuerySignature::of(&SearchParameters::new(&SearchScope::new(10, "en-US", "USD")).with_query("shoes"))
        );
        assert_ne!(
            sig,
            QuerySignature::of(&SearchParameters::new(&SearchScope::new(25, "de-DE", "EUR")).with_query("shoes"))
        );
        assert_ne!(sig, QuerySignature::of(&base.clone().with_query("boots")));
    }

    #[test]
    fn test_separators_are_escaped() {
        let a = SearchParameters::new(&scope()).with_refinement("c", "a,b");
        let b = SearchParameters::new(&scope())
            .with_refinement("c", "a")
            .with_refinement("c", "b");
        assert_ne!(QuerySignature::of(&a), QuerySignature::of(&b));
    }

    #[test]
    fn test_components_are_readable() {
        let params = SearchParameters::new(&scope())
            .with_query("shoes")
            .with_refinement("color", "red");
        let sig = QuerySignature::of(&params);
        assert!(sig.components().contains(&"query:shoes".to_string()));
        assert!(sig.components().contains(&"refine:color=red".to_string()));
    }
}
