//! Widget error types.

use thiserror::Error;
use turbo_data::FetchError;

#[derive(Error, Debug)]
pub enum WidgetError {
    /// The persisted payload could not be read.
    #[error("Failed to read recommendations: {0}")]
    Source(String),

    /// The persisted payload is not a recommendation response.
    #[error("Failed to decode recommendations: {0}")]
    Decode(#[from] serde_json::Error),

    /// An image could not be downloaded.
    #[error("Failed to load image {url}: {source}")]
    Image {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Invalid image URL: {0:?}")]
    InvalidUrl(String),
}
