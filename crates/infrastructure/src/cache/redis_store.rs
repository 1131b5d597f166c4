//! Redis persistent cache tier
//!
//! Tenant-scoped invalidation is driven by a secondary index set per
//! company (`company_keys:<id>`), maintained on every tenant-scoped
//! write. That keeps invalidation cost proportional to the company's
//! entry count instead of scanning the whole keyspace; SCAN is only used
//! for the narrower widget-prefix clears where the prefix is the leading
//! key token.

use super::{keys, CacheStats, CacheStore};
use async_trait::async_trait;
use dashboard_core::config::CacheSettings;
use dashboard_core::models::CompanyId;
use dashboard_core::{DashboardError, DashboardResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

/// Upper bound on how long a company index set may outlive its last
/// write; entries inside it expire on their own TTLs well before this.
const INDEX_TTL_SECONDS: i64 = 86_400;

const DELETE_CHUNK_SIZE: usize = 100;

/// Redis-backed [`CacheStore`] with a per-company key index
pub struct RedisCacheStore {
    client: Arc<redis::Client>,
    stats: Arc<RwLock<CacheStats>>,
    key_prefix: String,
}

impl RedisCacheStore {
    /// Create a new Redis cache store and verify connectivity
    pub async fn new(settings: &CacheSettings) -> DashboardResult<Self> {
        if !settings.enabled {
            return Err(DashboardError::Configuration(
                "persistent cache is disabled".to_string(),
            ));
        }

        info!("Connecting Redis cache store: {}", settings.redis_url);

        let client = redis::Client::open(settings.redis_url.clone())
            .map_err(|e| DashboardError::CacheUnavailable(e.to_string()))?;

        let mut conn = client
            .get_connection_manager()
            .await
            .map_err(|e| DashboardError::CacheUnavailable(e.to_string()))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| DashboardError::CacheUnavailable(e.to_string()))?;

        let key_prefix = settings
            .key_prefix
            .clone()
            .unwrap_or_else(|| "dashboard".to_string());

        info!("Redis cache store connected");

        Ok(Self {
            client: Arc::new(client),
            stats: Arc::new(RwLock::new(CacheStats::default())),
            key_prefix,
        })
    }

    async fn get_connection(&self) -> DashboardResult<redis::aio::ConnectionManager> {
        self.client
            .get_connection_manager()
            .await
            .map_err(|e| DashboardError::CacheUnavailable(e.to_string()))
    }

    /// Build full cache key with the deployment prefix
    fn build_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }

    async fn increment_hits(&self) {
        self.stats.write().await.hits += 1;
    }

    async fn increment_misses(&self) {
        self.stats.write().await.misses += 1;
    }

    async fn increment_sets(&self) {
        self.stats.write().await.sets += 1;
    }

    async fn increment_deletes(&self, count: u64) {
        self.stats.write().await.deletes += count;
    }

    async fn increment_errors(&self) {
        self.stats.write().await.errors += 1;
    }

    async fn cache_error(&self, context: &str, err: impl std::fmt::Display) -> DashboardError {
        error!("Cache {context} failed: {err}");
        self.increment_errors().await;
        DashboardError::CacheUnavailable(err.to_string())
    }

    /// Delete a batch of full keys, reporting partial progress on failure
    async fn delete_keys(
        &self,
        conn: &mut redis::aio::ConnectionManager,
        full_keys: &[String],
    ) -> DashboardResult<usize> {
        let mut deleted = 0usize;
        for chunk in full_keys.chunks(DELETE_CHUNK_SIZE) {
            let result: Result<usize, redis::RedisError> =
                redis::cmd("DEL").arg(chunk).query_async(conn).await;
            match result {
                Ok(n) => deleted += n,
                Err(e) => {
                    error!("Cache batch DELETE failed: {e}");
                    self.increment_errors().await;
                    return Err(DashboardError::PartialInvalidation {
                        deleted,
                        message: e.to_string(),
                    });
                }
            }
        }
        self.increment_deletes(deleted as u64).await;
        Ok(deleted)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> DashboardResult<Option<Vec<u8>>> {
        let full_key = self.build_key(key);
        let mut conn = self.get_connection().await?;

        let result: Result<Option<Vec<u8>>, redis::RedisError> = redis::cmd("GET")
            .arg(&full_key)
            .query_async(&mut conn)
            .await;

        match result {
            Ok(Some(value)) => {
                debug!("Cache HIT: {full_key}");
                self.increment_hits().await;
                Ok(Some(value))
            }
            Ok(None) => {
                debug!("Cache MISS: {full_key}");
                self.increment_misses().await;
                Ok(None)
            }
            Err(e) => Err(self.cache_error("GET", e).await),
        }
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> DashboardResult<()> {
        let full_key = self.build_key(key);
        debug!("Cache SET: {full_key} with TTL: {ttl:?}");

        let mut conn = self.get_connection().await?;

        // Tenant-scoped entries carry their index membership in the same
        // pipeline, with SADD ahead of SETEX: the entry is never live
        // without being reachable from delete_company. A stale index
        // member only costs an extra DEL later.
        let result: Result<(), redis::RedisError> = match keys::company_token(key) {
            Some(company) => {
                let index_key = self.build_key(&keys::company_index_key(company));
                redis::pipe()
                    .cmd("SADD")
                    .arg(&index_key)
                    .arg(&full_key)
                    .ignore()
                    .cmd("EXPIRE")
                    .arg(&index_key)
                    .arg(INDEX_TTL_SECONDS)
                    .ignore()
                    .cmd("SETEX")
                    .arg(&full_key)
                    .arg(ttl.as_secs() as i64)
                    .arg(value)
                    .ignore()
                    .query_async(&mut conn)
                    .await
            }
            None => {
                redis::cmd("SETEX")
                    .arg(&full_key)
                    .arg(ttl.as_secs() as i64)
                    .arg(value)
                    .query_async(&mut conn)
                    .await
            }
        };
        if let Err(e) = result {
            return Err(self.cache_error("SET", e).await);
        }

        self.increment_sets().await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> DashboardResult<bool> {
        let full_key = self.build_key(key);
        let mut conn = self.get_connection().await?;

        let result: Result<i32, redis::RedisError> = redis::cmd("DEL")
            .arg(&full_key)
            .query_async(&mut conn)
            .await;

        match result {
            Ok(n) => {
                let deleted = n > 0;
                if deleted {
                    debug!("Cache DELETE: {full_key}");
                    self.increment_deletes(1).await;
                }
                Ok(deleted)
            }
            Err(e) => Err(self.cache_error("DELETE", e).await),
        }
    }

    #[instrument(skip(self))]
    async fn delete_company(&self, company: CompanyId) -> DashboardResult<usize> {
        let index_key = self.build_key(&keys::company_index_key(company));
        let mut conn = self.get_connection().await?;

        let members: Result<Vec<String>, redis::RedisError> = redis::cmd("SMEMBERS")
            .arg(&index_key)
            .query_async(&mut conn)
            .await;
        let members = match members {
            Ok(members) => members,
            Err(e) => return Err(self.cache_error("SMEMBERS", e).await),
        };

        if members.is_empty() {
            debug!("No cached entries for company {company}");
            return Ok(0);
        }

        let deleted = self.delete_keys(&mut conn, &members).await?;

        // Index entries stay deleted even if this final DEL fails; a
        // retry simply finds an empty set.
        let result: Result<i32, redis::RedisError> = redis::cmd("DEL")
            .arg(&index_key)
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            error!("Cache index DELETE failed for company {company}: {e}");
            self.increment_errors().await;
            return Err(DashboardError::PartialInvalidation {
                deleted,
                message: e.to_string(),
            });
        }

        debug!("Cleared {deleted} cached entries for company {company}");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn delete_prefix(&self, prefix: &str) -> DashboardResult<usize> {
        let full_prefix = self.build_key(prefix);
        let mut conn = self.get_connection().await?;

        let mut matched: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let scan_result: Result<(u64, Vec<String>), redis::RedisError> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(format!("{full_prefix}*"))
                .arg("COUNT")
                .arg(1000)
                .query_async(&mut conn)
                .await;

            match scan_result {
                Ok((next_cursor, batch)) => {
                    matched.extend(batch);
                    if next_cursor == 0 {
                        break;
                    }
                    cursor = next_cursor;
                }
                Err(e) => return Err(self.cache_error("SCAN", e).await),
            }
        }

        if matched.is_empty() {
            debug!("No keys found with prefix: {full_prefix}");
            return Ok(0);
        }

        let deleted = self.delete_keys(&mut conn, &matched).await?;
        debug!("Cache prefix clear: {deleted} keys deleted under {full_prefix}");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> DashboardResult<bool> {
        let mut conn = self.get_connection().await?;

        let result: Result<String, redis::RedisError> =
            redis::cmd("PING").query_async(&mut conn).await;
        match result {
            Ok(pong) => Ok(pong == "PONG"),
            Err(e) => Err(self.cache_error("PING", e).await),
        }
    }

    async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }
}

impl Clone for RedisCacheStore {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            stats: Arc::clone(&self.stats),
            key_prefix: self.key_prefix.clone(),
        }
    }
}
