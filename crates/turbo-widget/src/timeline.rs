//! Widget timeline construction.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use turbo_data::FetchClient;

use crate::error::WidgetError;
use crate::recommendation::Recommendation;

/// Time each recommendation stays on screen.
pub const ENTRY_SPACING_SECS: i64 = 30;

/// How long to wait before looking again when there is nothing to show.
pub const EMPTY_REFRESH_SECS: i64 = 60 * 60;

/// Downloads product images.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Vec<u8>, WidgetError>;
}

/// Image loader over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpImageLoader {
    client: FetchClient,
}

impl HttpImageLoader {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, url: &str) -> Result<Vec<u8>, WidgetError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(WidgetError::InvalidUrl(url.to_string()));
        }
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| WidgetError::Image {
                url: url.to_string(),
                source,
            })?;
        Ok(response.body)
    }
}

/// One frame of the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub date: DateTime<Utc>,
    /// `None` renders the "no recommendations" state.
    pub recommendation: Option<Recommendation>,
    pub image: Option<Vec<u8>>,
}

/// When the host should ask for a new timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// After the last entry has been shown.
    AtEnd,
    After(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    pub policy: RefreshPolicy,
}

/// Build the timeline for `recs`, starting at `now`.
pub async fn build_timeline(
    now: DateTime<Utc>,
    recs: Vec<Recommendation>,
    loader: &dyn ImageLoader,
) -> Timeline {
    if recs.is_empty() {
        debug!("no recommendations, showing placeholder");
        return Timeline {
            entries: vec![TimelineEntry {
                date: now,
                recommendation: None,
                image: None,
            }],
            policy: RefreshPolicy::After(now + Duration::seconds(EMPTY_REFRESH_SECS)),
        };
    }

    let mut entries = Vec::with_capacity(recs.len());
    for (index, rec) in recs.into_iter().enumerate() {
        let date = now + Duration::seconds(index as i64 * ENTRY_SPACING_SECS);
        let image = match loader.load(&rec.image_url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(id = %rec.id, error = %e, "image download failed");
                None
            }
        };
        entries.push(TimelineEntry {
            date,
            recommendation: Some(rec),
            image,
        });
    }

    Timeline {
        entries,
        policy: RefreshPolicy::AtEnd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct FakeLoader;

    #[async_trait]
    impl ImageLoader for FakeLoader {
        async fn load(&self, url: &str) -> Result<Vec<u8>, WidgetError> {
            if url.contains("broken") {
                Err(WidgetError::InvalidUrl(url.to_string()))
            } else {
                Ok(url.as_bytes().to_vec())
            }
        }
    }

    fn rec(id: &str, image_url: &str) -> Recommendation {
        Recommendation {
            id: id.to_string(),
            image_url: image_url.to_string(),
            product_name: format!("Product {}", id),
            product_url: format!("https://shop/{}", id),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_empty_timeline_retries_in_an_hour() {
        let timeline = build_timeline(now(), Vec::new(), &FakeLoader).await;
        assert_eq!(timeline.entries.len(), 1);
        assert_eq!(timeline.entries[0].recommendation, None);
        assert_eq!(
            timeline.policy,
            RefreshPolicy::After(now() + Duration::hours(1))
        );
    }

    #[tokio::test]
    async fn test_entries_are_spaced_and_tolerate_image_failures() {
        let recs = vec![
            rec("a", "https://img/a.jpg"),
            rec("b", "https://img/broken.jpg"),
            rec("c", ""),
        ];
        let timeline = build_timeline(now(), recs, &FakeLoader).await;

        assert_eq!(timeline.policy, RefreshPolicy::AtEnd);
        assert_eq!(timeline.entries.len(), 3);
        assert_eq!(timeline.entries[1].date, now() + Duration::seconds(30));
        assert_eq!(timeline.entries[2].date, now() + Duration::seconds(60));
        assert!(timeline.entries[0].image.is_some());
        assert!(timeline.entries[1].image.is_none());
        assert_eq!(
            timeline.entries[1].recommendation.as_ref().map(|r| r.id.as_str()),
            Some("b")
        );
    }

    #[tokio::test]
    async fn test_http_loader_rejects_non_http_urls() {
        let loader = HttpImageLoader::default();
        assert!(matches!(
            loader.load("").await,
            Err(WidgetError::InvalidUrl(_))
        ));
    }
}
