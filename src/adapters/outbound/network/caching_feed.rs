use crate::image_analysis::domain::VulnerabilityRecord;
use crate::ports::outbound::VulnerabilityFeed;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// CachingFeedClient wraps a VulnerabilityFeed and adds in-memory caching.
///
/// This adapter implements the decorator pattern to add caching capability
/// to any VulnerabilityFeed implementation. The cache is thread-safe and
/// suitable for concurrent access; within one scan the same keyword can
/// surface several times (identical package names across layers, retried
/// batches), and each keyword should cost at most one feed request.
///
/// Failed queries are not cached, so a retry after a transient failure
/// reaches the feed again.
pub struct CachingFeedClient<F: VulnerabilityFeed> {
    inner: F,
    cache: Arc<DashMap<String, Vec<VulnerabilityRecord>>>,
}

impl<F: VulnerabilityFeed> CachingFeedClient<F> {
    /// Creates a new caching client wrapping the given inner feed
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Returns the current cache size (for testing/monitoring)
    #[cfg(test)]
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<F: VulnerabilityFeed> VulnerabilityFeed for CachingFeedClient<F> {
    async fn query(&self, keyword: &str) -> Result<Vec<VulnerabilityRecord>> {
        if let Some(cached) = self.cache.get(keyword) {
            return Ok(cached.clone());
        }

        let records = self.inner.query(keyword).await?;
        self.cache.insert(keyword.to_string(), records.clone());

        Ok(records)
    }
}
