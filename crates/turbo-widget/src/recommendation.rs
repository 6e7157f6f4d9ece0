//! Persisted product recommendations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::WidgetError;

/// Recommendation response as stored by the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationPayload {
    #[serde(rename = "recoUUID")]
    pub reco_uuid: String,
    pub recs: Vec<Recommendation>,
}

/// One recommended product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub image_url: String,
    pub product_name: String,
    pub product_url: String,
}

impl Recommendation {
    /// App link opening this product, e.g. `myapp://product/25591862M`.
    pub fn deep_link(&self, scheme: &str) -> String {
        format!("{}://product/{}", scheme, self.id)
    }
}

/// Where the persisted payload lives.
pub trait RecommendationSource {
    /// Raw payload, or `None` when nothing was stored yet.
    fn load(&self) -> Result<Option<String>, WidgetError>;
}

/// In-memory payload.
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Option<String>);

impl RecommendationSource for StaticSource {
    fn load(&self) -> Result<Option<String>, WidgetError> {
        Ok(self.0.clone())
    }
}

/// Payload stored in a JSON file; a missing file means no recommendations.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecommendationSource for FileSource {
    fn load(&self) -> Result<Option<String>, WidgetError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WidgetError::Source(format!("{}: {}", self.path.display(), e))),
        }
    }
}

/// Decode a stored payload.
pub fn decode(raw: &str) -> Result<RecommendationPayload, WidgetError> {
    Ok(serde_json::from_str(raw)?)
}

/// Load recommendations from `source`, treating any failure as "none".
pub fn load_recommendations(source: &dyn RecommendationSource) -> Vec<Recommendation> {
    let raw = match source.load() {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("no recommendations stored");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "reading recommendations failed");
            return Vec::new();
        }
    };

    match decode(&raw) {
        Ok(payload) => {
            debug!(reco_uuid = %payload.reco_uuid, count = payload.recs.len(), "recommendations loaded");
            payload.recs
        }
        Err(e) => {
            warn!(error = %e, "decoding recommendations failed");
            Vec::new()
        }
    }
}
