//! Two-tier cache manager
//!
//! Read path: request tier (no I/O) -> persistent tier -> compute.
//! The persistent tier is a performance optimization, never a
//! correctness dependency: when it is unreachable the manager degrades
//! to recomputing through the supplied closure and keeps serving.

use super::{keys, CacheStore, CacheStoreExt, RequestCache};
use dashboard_core::models::{ClientId, CompanyId};
use dashboard_core::{DashboardError, DashboardResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct TwoTierCacheManager {
    store: Arc<dyn CacheStore>,
}

impl TwoTierCacheManager {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn CacheStore> {
        Arc::clone(&self.store)
    }

    /// Read-through lookup guaranteeing at most one computation per key
    /// per request scope.
    ///
    /// On a full miss the computed value is written to the persistent
    /// tier under `ttl` and to the request tier with no expiry (valid
    /// until the invalidation boundary). Persistent tier failures on
    /// either side degrade gracefully; compute errors propagate
    /// unchanged.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        scope: &mut RequestCache,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> DashboardResult<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = DashboardResult<T>>,
    {
        if let Some(value) = scope.get_typed::<T>(key)? {
            debug!("Request tier hit: {key}");
            return Ok(value);
        }

        match self.store.get_typed::<T>(key).await {
            Ok(Some(value)) => {
                debug!("Persistent tier hit: {key}");
                scope.insert(key, &value)?;
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Persistent tier read failed for {key}, recomputing: {e}");
            }
        }

        let value = compute().await?;

        if let Err(e) = self.store.set_typed(key, &value, ttl).await {
            // The overwrite is idempotent; losing it only costs a future
            // recomputation bounded by the request tier's lifetime.
            warn!("Persistent tier write failed for {key}: {e}");
        }
        scope.insert(key, &value)?;
        Ok(value)
    }

    /// Remove every persistent entry belonging to `company` and clear
    /// the request tier unconditionally.
    ///
    /// Not atomic across keys: a concurrent populate for the same
    /// company may slip through and costs one extra recomputation. The
    /// operation is idempotent and safe to retry on
    /// [`DashboardError::PartialInvalidation`].
    ///
    /// [`DashboardError::PartialInvalidation`]: dashboard_core::DashboardError::PartialInvalidation
    pub async fn invalidate_company(
        &self,
        scope: &mut RequestCache,
        company: CompanyId,
    ) -> DashboardResult<usize> {
        scope.clear();
        let deleted = self.store.delete_company(company).await?;
        debug!("Invalidated {deleted} persistent entries for company {company}");
        Ok(deleted)
    }

    /// Narrow invalidation targeting one widget type, optionally scoped
    /// to a company and client. Unrelated widget types are never touched.
    /// Client scoping requires company scoping; a client without a
    /// company is rejected rather than silently widened to a type-wide
    /// clear.
    pub async fn invalidate_widget(
        &self,
        scope: &mut RequestCache,
        widget_type: &str,
        company: Option<CompanyId>,
        client: Option<ClientId>,
    ) -> DashboardResult<usize> {
        if client.is_some() && company.is_none() {
            return Err(DashboardError::Configuration(
                "client-scoped invalidation requires a company scope".to_string(),
            ));
        }

        let mut deleted = 0usize;

        if let (Some(company), Some(client)) = (company, client) {
            let exact = keys::widget_key(widget_type, company, Some(client));
            scope.remove(&exact);
            scope.remove_prefix(&format!("{exact}:"));
            deleted += usize::from(self.store.delete(&exact).await?);
            deleted += self.store.delete_prefix(&format!("{exact}:")).await?;
            return Ok(deleted);
        }

        let prefix = keys::widget_clear_prefix(widget_type, company);
        scope.remove_prefix(&prefix);
        if let Some(company) = company {
            // The company-wide widget key carries no window suffix, so the
            // colon-terminated prefix alone would miss it.
            let exact = keys::widget_key(widget_type, company, None);
            scope.remove(&exact);
            deleted += usize::from(self.store.delete(&exact).await?);
        }
        deleted += self.store.delete_prefix(&prefix).await?;
        debug!("Invalidated {deleted} persistent entries for widget {widget_type}");
        Ok(deleted)
    }
}
