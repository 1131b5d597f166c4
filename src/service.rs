//! Dashboard metrics facade
//!
//! The outermost surface of the engine: request handlers create one
//! [`RequestCache`] per processing unit and call the getters below.
//! Every getter validates its window before touching any store, runs
//! read-through caching with the metric's TTL, and reports its elapsed
//! time to the performance tracker.

use dashboard_core::config::{CacheSettings, DashboardConfig};
use dashboard_core::models::{ClientId, CompanyId, DateWindow, LabeledWindow, MetricKind};
use dashboard_core::{DashboardError, DashboardResult};
use dashboard_domain::repositories::MetricsRepository;
use dashboard_domain::scheduling::WidgetSchedulingPolicy;
use dashboard_domain::stats::{
    ClientStatistics, DailyChartData, InvoiceStatistics, PaymentStatistics, PeriodStatistics,
};
use dashboard_infrastructure::cache::{keys, CacheStore, RequestCache, TwoTierCacheManager};
use dashboard_infrastructure::performance::PerformanceTracker;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

pub struct DashboardMetricsService {
    repository: Arc<dyn MetricsRepository>,
    cache: TwoTierCacheManager,
    policy: WidgetSchedulingPolicy,
    tracker: PerformanceTracker,
    cache_settings: CacheSettings,
}

impl DashboardMetricsService {
    pub fn new(
        repository: Arc<dyn MetricsRepository>,
        store: Arc<dyn CacheStore>,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            repository,
            cache: TwoTierCacheManager::new(Arc::clone(&store)),
            policy: WidgetSchedulingPolicy::from_config(config),
            tracker: PerformanceTracker::new(store, config.performance.clone()),
            cache_settings: config.cache.clone(),
        }
    }

    /// Widget scheduling decisions (lazy loading, strategy, priority)
    pub fn policy(&self) -> &WidgetSchedulingPolicy {
        &self.policy
    }

    /// Widget load-time tracking and daily analytics
    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    pub fn cache(&self) -> &TwoTierCacheManager {
        &self.cache
    }

    #[instrument(skip(self, scope))]
    pub async fn invoice_stats(
        &self,
        scope: &mut RequestCache,
        company: CompanyId,
        window: DateWindow,
    ) -> DashboardResult<InvoiceStatistics> {
        let window = DateWindow::new(window.start, window.end)?;
        let kind = MetricKind::InvoiceStats;
        let key = keys::metric_key(kind, company, &window);
        let started = Instant::now();

        let repository = Arc::clone(&self.repository);
        let result = self
            .cache
            .get_or_compute(scope, &key, kind.ttl(&self.cache_settings), || async move {
                repository.invoice_stats(company, &window).await
            })
            .await;

        self.track(kind, company, started, result.is_ok()).await;
        result
    }

    #[instrument(skip(self, scope))]
    pub async fn payment_stats(
        &self,
        scope: &mut RequestCache,
        company: CompanyId,
        window: DateWindow,
    ) -> DashboardResult<PaymentStatistics> {
        let window = DateWindow::new(window.start, window.end)?;
        let kind = MetricKind::PaymentStats;
        let key = keys::metric_key(kind, company, &window);
        let started = Instant::now();

        let repository = Arc::clone(&self.repository);
        let result = self
            .cache
            .get_or_compute(scope, &key, kind.ttl(&self.cache_settings), || async move {
                repository.payment_stats(company, &window).await
            })
            .await;

        self.track(kind, company, started, result.is_ok()).await;
        result
    }

    #[instrument(skip(self, scope))]
    pub async fn client_stats(
        &self,
        scope: &mut RequestCache,
        company: CompanyId,
        window: DateWindow,
    ) -> DashboardResult<ClientStatistics> {
        let window = DateWindow::new(window.start, window.end)?;
        let kind = MetricKind::ClientStats;
        let key = keys::metric_key(kind, company, &window);
        let started = Instant::now();

        let repository = Arc::clone(&self.repository);
        let result = self
            .cache
            .get_or_compute(scope, &key, kind.ttl(&self.cache_settings), || async move {
                repository.client_stats(company, &window).await
            })
            .await;

        self.track(kind, company, started, result.is_ok()).await;
        result
    }

    #[instrument(skip(self, scope))]
    pub async fn daily_chart(
        &self,
        scope: &mut RequestCache,
        company: CompanyId,
        window: DateWindow,
    ) -> DashboardResult<DailyChartData> {
        let window = DateWindow::new(window.start, window.end)?;
        let kind = MetricKind::DailyChart;
        let key = keys::metric_key(kind, company, &window);
        let started = Instant::now();

        let repository = Arc::clone(&self.repository);
        let result = self
            .cache
            .get_or_compute(scope, &key, kind.ttl(&self.cache_settings), || async move {
                repository.daily_chart(company, &window).await
            })
            .await;

        self.track(kind, company, started, result.is_ok()).await;
        result
    }

    /// Multi-period invoice aggregate: one data store pass for all
    /// periods, results in input order. An empty period list returns an
    /// empty Vec without touching any store tier.
    #[instrument(skip(self, scope, periods))]
    pub async fn multi_period_invoice_stats(
        &self,
        scope: &mut RequestCache,
        company: CompanyId,
        periods: Vec<LabeledWindow>,
    ) -> DashboardResult<Vec<PeriodStatistics>> {
        if periods.is_empty() {
            return Ok(Vec::new());
        }
        Self::validate_periods(&periods)?;

        let kind = MetricKind::MultiPeriodInvoiceStats;
        let key = keys::multi_period_key(company, &periods);
        let started = Instant::now();

        let repository = Arc::clone(&self.repository);
        let result = self
            .cache
            .get_or_compute(scope, &key, kind.ttl(&self.cache_settings), || async move {
                repository.multi_period_invoice_stats(company, &periods).await
            })
            .await;

        self.track(kind, company, started, result.is_ok()).await;
        result
    }

    /// Remove every cached aggregate of one company from both tiers.
    /// Safe to retry on a partial failure.
    pub async fn clear_company_cache(
        &self,
        scope: &mut RequestCache,
        company: CompanyId,
    ) -> DashboardResult<usize> {
        self.cache.invalidate_company(scope, company).await
    }

    /// Remove the cached entries of one widget type, optionally narrowed
    /// to a company and client. A client scope without a company scope is
    /// rejected.
    pub async fn clear_widget_cache(
        &self,
        scope: &mut RequestCache,
        widget_type: &str,
        company: Option<CompanyId>,
        client: Option<ClientId>,
    ) -> DashboardResult<usize> {
        self.cache
            .invalidate_widget(scope, widget_type, company, client)
            .await
    }

    fn validate_periods(periods: &[LabeledWindow]) -> DashboardResult<()> {
        let mut seen = HashSet::with_capacity(periods.len());
        for period in periods {
            // Labels were checked at construction; windows and duplicate
            // labels are checked at the operation boundary.
            DateWindow::new(period.window.start, period.window.end)?;
            if !seen.insert(period.label.as_str()) {
                return Err(DashboardError::invalid_window(format!(
                    "duplicate period label '{}'",
                    period.label
                )));
            }
        }
        Ok(())
    }

    async fn track(&self, kind: MetricKind, company: CompanyId, started: Instant, success: bool) {
        self.tracker
            .record(
                kind.as_str(),
                started.elapsed().as_secs_f64(),
                json!({ "company_id": company.0, "success": success }),
            )
            .await;
    }
}
