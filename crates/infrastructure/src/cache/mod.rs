//! Two-tier caching infrastructure for dashboard aggregates
//!
//! The persistent tier (Redis, or the in-memory store for embedded and
//! test use) is shared across processing units and bounded by TTLs; the
//! request tier lives inside one processing unit and is discarded with it.

pub mod keys;
pub mod manager;
pub mod memory_store;
pub mod redis_store;
pub mod request_scope;

pub use manager::TwoTierCacheManager;
pub use memory_store::MemoryCacheStore;
pub use redis_store::RedisCacheStore;
pub use request_scope::RequestCache;

use async_trait::async_trait;
use dashboard_core::models::CompanyId;
use dashboard_core::{DashboardError, DashboardResult};
use std::time::Duration;

/// Cache statistics and metrics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }
}

/// Persistent cache tier port.
///
/// Single-key operations rely on the backing store's own atomicity.
/// Company-scoped deletion is not atomic across keys: it may race with a
/// concurrent populate, which at worst costs one extra recomputation.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value from cache as raw bytes
    async fn get(&self, key: &str) -> DashboardResult<Option<Vec<u8>>>;

    /// Set a value in cache with TTL (pure key overwrite, idempotent)
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> DashboardResult<()>;

    /// Delete a single key, returning whether it existed
    async fn delete(&self, key: &str) -> DashboardResult<bool>;

    /// Delete every entry whose key carries this company token, returning
    /// the number of entries removed. Entries of other companies must
    /// never be touched.
    async fn delete_company(&self, company: CompanyId) -> DashboardResult<usize>;

    /// Delete every entry whose key starts with `prefix`
    async fn delete_prefix(&self, prefix: &str) -> DashboardResult<usize>;

    /// Health check for the backing store
    async fn health_check(&self) -> DashboardResult<bool>;

    /// Operation counters for this store instance
    async fn stats(&self) -> CacheStats;
}

/// Extension trait for convenient type-safe caching
#[async_trait]
pub trait CacheStoreExt: Send + Sync {
    /// Get a typed value from cache
    async fn get_typed<T>(&self, key: &str) -> DashboardResult<Option<T>>
    where
        T: serde::de::DeserializeOwned + Send + Sync;

    /// Set a typed value in cache with TTL
    async fn set_typed<T>(&self, key: &str, value: &T, ttl: Duration) -> DashboardResult<()>
    where
        T: serde::Serialize + Send + Sync;
}

#[async_trait]
impl<T: CacheStore + ?Sized> CacheStoreExt for T {
    async fn get_typed<U>(&self, key: &str) -> DashboardResult<Option<U>>
    where
        U: serde::de::DeserializeOwned + Send + Sync,
    {
        match self.get(key).await? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| DashboardError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set_typed<U>(&self, key: &str, value: &U, ttl: Duration) -> DashboardResult<()>
    where
        U: serde::Serialize + Send + Sync,
    {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| DashboardError::Serialization(e.to_string()))?;
        self.set(key, &bytes, ttl).await
    }
}
