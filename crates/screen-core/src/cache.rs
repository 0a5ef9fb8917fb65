//! Caching layer for fetched payloads to reduce API calls

use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::api::FundamentalsSource;
use crate::error::Result;
use crate::payload::RawPayload;

/// Thread-safe TTL cache of raw payloads, keyed by upper-cased symbol
pub struct PayloadCache {
    cache: RwLock<TimedCache<String, RawPayload>>,
}

impl PayloadCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(TimedCache::with_lifespan(ttl)),
        }
    }

    fn key(symbol: &str) -> String {
        symbol.trim().to_uppercase()
    }

    /// Get a payload from the cache
    pub async fn get(&self, symbol: &str) -> Option<RawPayload> {
        let mut cache = self.cache.write().await;
        cache.cache_get(&Self::key(symbol)).cloned()
    }

    /// Insert a payload into the cache
    pub async fn insert(&self, symbol: &str, payload: RawPayload) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(Self::key(symbol), payload);
    }

    /// Get or fetch a payload using the provided fetcher function
    ///
    /// Failed fetches are not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, symbol: &str, fetcher: F) -> std::result::Result<RawPayload, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<RawPayload, E>>,
    {
        if let Some(payload) = self.get(symbol).await {
            tracing::debug!("Cache hit for symbol: {}", symbol);
            return Ok(payload);
        }

        tracing::debug!("Cache miss for symbol: {}", symbol);

        let payload = fetcher().await?;
        self.insert(symbol, payload.clone()).await;

        Ok(payload)
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// A [`FundamentalsSource`] that remembers successful fetches
pub struct CachedSource<S> {
    inner: S,
    cache: PayloadCache,
}

impl<S: FundamentalsSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: PayloadCache::new(ttl),
        }
    }

    pub fn cache(&self) -> &PayloadCache {
        &self.cache
    }
}

#[async_trait]
impl<S: FundamentalsSource> FundamentalsSource for CachedSource<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch(&self, symbol: &str) -> Result<RawPayload> {
        self.cache
            .get_or_fetch(symbol, || self.inner.fetch(symbol))
            .await
    }
}
