//! In-process persistent-tier implementation
//!
//! Backs embedded deployments and tests with the same `CacheStore`
//! contract as Redis, including TTL expiry and company-token scoped
//! deletion. Not shared across processes, but safe across tasks.

use super::{keys, CacheStats, CacheStore};
use async_trait::async_trait;
use dashboard_core::models::CompanyId;
use dashboard_core::DashboardResult;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-memory [`CacheStore`]
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
    stats: RwLock<CacheStats>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> DashboardResult<Option<Vec<u8>>> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                let value = entry.value.clone();
                self.stats.write().await.hits += 1;
                Ok(Some(value))
            }
            Some(_) => {
                // Expired: drop lazily on access, like the TTL store would
                entries.remove(key);
                self.stats.write().await.misses += 1;
                Ok(None)
            }
            None => {
                self.stats.write().await.misses += 1;
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> DashboardResult<()> {
        let entry = StoredEntry {
            value: value.to_vec(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        self.stats.write().await.sets += 1;
        Ok(())
    }

    async fn delete(&self, key: &str) -> DashboardResult<bool> {
        let removed = self.entries.write().await.remove(key).is_some();
        if removed {
            self.stats.write().await.deletes += 1;
        }
        Ok(removed)
    }

    async fn delete_company(&self, company: CompanyId) -> DashboardResult<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| keys::company_token(key) != Some(company));
        let deleted = before - entries.len();
        self.stats.write().await.deletes += deleted as u64;
        Ok(deleted)
    }

    async fn delete_prefix(&self, prefix: &str) -> DashboardResult<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let deleted = before - entries.len();
        self.stats.write().await.deletes += deleted as u64;
        Ok(deleted)
    }

    async fn health_check(&self) -> DashboardResult<bool> {
        Ok(true)
    }

    async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }
}
