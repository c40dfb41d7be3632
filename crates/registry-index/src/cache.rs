use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use crate::error::RegistryError;
use crate::index::CrateMetadata;
use crate::lookup::{RegistryLookup, RegistrySource};

/// Cache TTL: 5 minutes
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Read-through cache in front of another lookup, keyed by
/// `(index url, lowercase crate name)`. Entries expire passively and
/// failures are never cached.
pub struct CachedLookup<L> {
    inner: L,
    cache: Cache<(String, String), CrateMetadata>,
}

impl<L: RegistryLookup> CachedLookup<L> {
    pub fn new(inner: L) -> Self {
        Self::with_ttl(inner, CACHE_TTL)
    }

    pub fn with_ttl(inner: L, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder().time_to_live(ttl).max_capacity(1000).build(),
        }
    }
}

#[async_trait]
impl<L: RegistryLookup> RegistryLookup for CachedLookup<L> {
    async fn get_versions(
        &self,
        name: &str,
        source: &RegistrySource,
    ) -> Result<CrateMetadata, RegistryError> {
        let key = (source.index.clone(), name.to_lowercase());
        if let Some(cached) = self.cache.get(&key).await {
            debug!("cache hit for '{}'", name);
            return Ok(cached);
        }

        debug!("cache miss for '{}', fetching from index", name);
        let metadata = self.inner.get_versions(name, source).await?;
        self.cache.insert(key, metadata.clone()).await;
        Ok(metadata)
    }
}
