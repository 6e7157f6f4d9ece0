//! Newtype IDs for catalog identifiers.
//!
//! Attribute ids, sort ids and product ids all travel as strings on the wire;
//! the newtypes keep them from being swapped for one another or for plain
//! refinement values.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Product (or product master) identifier.
    ProductId
);
define_id!(
    /// Facet attribute identifier, e.g. `c_refinementColor` or `cgid`.
    AttributeId
);
define_id!(
    /// Backend-defined sorting rule identifier, e.g. `best-matches`.
    SortId
);
define_id!(
    /// Catalog category identifier.
    CategoryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_order_by_string() {
        let mut ids = vec![AttributeId::new("size"), AttributeId::new("color")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "color");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&SortId::new("price-low-to-high")).unwrap();
        assert_eq!(json, "\"price-low-to-high\"");
    }
}
