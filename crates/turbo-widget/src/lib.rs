//! Home-screen recommendation widget for the TurboCommerce storefront client.
//!
//! Reads the recommendation payload the app persists for the widget and
//! turns it into a timeline of entries, one product every 30 seconds. The
//! widget shares no state with the search engine.

pub mod error;
pub mod recommendation;
pub mod timeline;

pub use error::WidgetError;
pub use recommendation::{
    load_recommendations, FileSource, Recommendation, RecommendationPayload, RecommendationSource,
    StaticSource,
};
pub use timeline::{build_timeline, HttpImageLoader, ImageLoader, RefreshPolicy, Timeline, TimelineEntry};
