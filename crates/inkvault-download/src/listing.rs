//! Chapter listing with a store-backed cache.
//!
//! Listing a series hits the provider's site, which is the expensive and
//! rate-limited part of browsing. Results are cached in the record store
//! and reused while fresh; cache failures only log, the listing itself
//! never fails because of the cache.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use inkvault_core::{Chapter, ChapterListCache, DownloadError, RecordStorePort};
use inkvault_providers::ProviderRegistry;

/// Default freshness window for cached chapter listings.
const DEFAULT_MAX_AGE_MINUTES: i64 = 30;

pub struct ChapterListService {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn RecordStorePort>,
    max_age: Duration,
}

impl ChapterListService {
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, store: Arc<dyn RecordStorePort>) -> Self {
        Self {
            registry,
            store,
            max_age: Duration::minutes(DEFAULT_MAX_AGE_MINUTES),
        }
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Chapter list for a series, oldest first, from cache when fresh.
    pub async fn chapter_list(
        &self,
        provider_id: &str,
        series_id: &str,
    ) -> Result<Vec<Chapter>, DownloadError> {
        match self.store.chapter_list_cache(provider_id, series_id).await {
            Ok(Some(cache)) if cache.is_fresh(self.max_age, Utc::now()) => {
                debug!(
                    target: "inkvault.download",
                    provider_id = %provider_id,
                    series_id = %series_id,
                    chapters = cache.chapters.len(),
                    "chapter list served from cache"
                );
                return Ok(cache.chapters);
            }
            Ok(_) => {}
            Err(err) => {
                warn!(
                    target: "inkvault.download",
                    provider_id = %provider_id,
                    series_id = %series_id,
                    error = %err,
                    "chapter list cache read failed"
                );
            }
        }

        let provider = self
            .registry
            .get(provider_id)
            .ok_or_else(|| DownloadError::unknown_provider(provider_id))?;

        let chapters = provider
            .fetch_chapter_list(series_id)
            .await
            .map_err(|e| DownloadError::provider_unavailable(provider_id, e.to_string()))?;

        if let Err(err) = self
            .store
            .put_chapter_list_cache(ChapterListCache {
                provider_id: provider_id.to_string(),
                series_id: series_id.to_string(),
                chapters: chapters.clone(),
                cached_at: Utc::now(),
            })
            .await
        {
            warn!(
                target: "inkvault.download",
                provider_id = %provider_id,
                series_id = %series_id,
                error = %err,
                "chapter list cache write failed"
            );
        }

        Ok(chapters)
    }
}
