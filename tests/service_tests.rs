//! Service-level tests over the in-memory cache store

use async_trait::async_trait;
use chrono::NaiveDate;
use dashboard::{
    ClientStatistics, CompanyId, DailyChartData, DashboardConfig, DashboardError,
    DashboardMetricsService, DashboardResult, DateWindow, InvoiceStatistics, LabeledWindow,
    MemoryCacheStore, MetricsRepository, PaymentStatistics, PeriodStatistics, RequestCache,
};
use mockall::mock;
use mockall::predicate::always;
use std::sync::Arc;

mock! {
    pub Repo {}

    #[async_trait]
    impl MetricsRepository for Repo {
        async fn invoice_stats(
            &self,
            company: CompanyId,
            window: &DateWindow,
        ) -> DashboardResult<InvoiceStatistics>;

        async fn payment_stats(
            &self,
            company: CompanyId,
            window: &DateWindow,
        ) -> DashboardResult<PaymentStatistics>;

        async fn client_stats(
            &self,
            company: CompanyId,
            window: &DateWindow,
        ) -> DashboardResult<ClientStatistics>;

        async fn daily_chart(
            &self,
            company: CompanyId,
            window: &DateWindow,
        ) -> DashboardResult<DailyChartData>;

        async fn multi_period_invoice_stats(
            &self,
            company: CompanyId,
            periods: &[LabeledWindow],
        ) -> DashboardResult<Vec<PeriodStatistics>>;
    }
}

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn window(m1: u32, d1: u32, m2: u32, d2: u32) -> DateWindow {
    DateWindow::new(day(m1, d1), day(m2, d2)).unwrap()
}

fn service(repository: MockRepo) -> DashboardMetricsService {
    DashboardMetricsService::new(
        Arc::new(repository),
        Arc::new(MemoryCacheStore::new()),
        &DashboardConfig::default(),
    )
}

#[tokio::test]
async fn test_read_through_computes_once_per_request() {
    let mut repository = MockRepo::new();
    repository
        .expect_invoice_stats()
        .times(1)
        .returning(|_, _| {
            Ok(InvoiceStatistics {
                total_amount: 100.0,
                invoice_count: 2,
                ..Default::default()
            })
        });
    let service = service(repository);
    let mut scope = RequestCache::new();

    let first = service
        .invoice_stats(&mut scope, CompanyId(1), window(1, 1, 1, 31))
        .await
        .unwrap();
    let second = service
        .invoice_stats(&mut scope, CompanyId(1), window(1, 1, 1, 31))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.total_amount, 100.0);
}

#[tokio::test]
async fn test_persistent_tier_serves_later_requests() {
    let mut repository = MockRepo::new();
    repository
        .expect_payment_stats()
        .times(1)
        .returning(|_, _| {
            Ok(PaymentStatistics {
                total_received: 42.0,
                payment_count: 1,
                ..Default::default()
            })
        });
    let service = service(repository);

    for _ in 0..3 {
        // Fresh request scope each time; only the first computes
        let mut scope = RequestCache::new();
        let stats = service
            .payment_stats(&mut scope, CompanyId(1), window(1, 1, 1, 31))
            .await
            .unwrap();
        assert_eq!(stats.total_received, 42.0);
    }
}

#[tokio::test]
async fn test_invalid_window_rejected_before_any_query() {
    // No expectations set: any repository call would panic the mock
    let service = service(MockRepo::new());
    let mut scope = RequestCache::new();

    let reversed = DateWindow {
        start: day(2, 1),
        end: day(1, 1),
    };
    let result = service
        .invoice_stats(&mut scope, CompanyId(1), reversed)
        .await;
    assert!(matches!(result, Err(DashboardError::InvalidWindow(_))));
    assert!(scope.is_empty());
}

#[tokio::test]
async fn test_empty_period_list_short_circuits() {
    let service = service(MockRepo::new());
    let mut scope = RequestCache::new();

    let results = service
        .multi_period_invoice_stats(&mut scope, CompanyId(1), Vec::new())
        .await
        .unwrap();
    assert!(results.is_empty());
    // Nothing was cached either
    assert!(scope.is_empty());
}

#[tokio::test]
async fn test_duplicate_period_labels_rejected() {
    let service = service(MockRepo::new());
    let mut scope = RequestCache::new();

    let periods = vec![
        LabeledWindow::new("q1", window(1, 1, 3, 31)).unwrap(),
        LabeledWindow::new("q1", window(4, 1, 6, 30)).unwrap(),
    ];
    let result = service
        .multi_period_invoice_stats(&mut scope, CompanyId(1), periods)
        .await;
    assert!(matches!(result, Err(DashboardError::InvalidWindow(_))));
}

#[tokio::test]
async fn test_clear_company_cache_isolates_tenants() {
    let mut repository = MockRepo::new();
    // Company 1 is recomputed after its cache clear; company 2 is not
    repository
        .expect_client_stats()
        .withf(|company, _| company.0 == 1)
        .times(2)
        .returning(|_, _| Ok(ClientStatistics::default()));
    repository
        .expect_client_stats()
        .withf(|company, _| company.0 == 2)
        .times(1)
        .returning(|_, _| Ok(ClientStatistics::default()));
    let service = service(repository);
    let w = window(1, 1, 1, 31);

    let mut scope = RequestCache::new();
    service.client_stats(&mut scope, CompanyId(1), w).await.unwrap();
    service.client_stats(&mut scope, CompanyId(2), w).await.unwrap();

    service
        .clear_company_cache(&mut scope, CompanyId(1))
        .await
        .unwrap();

    // New request scopes: company 1 misses both tiers, company 2 still
    // hits the persistent tier.
    let mut scope = RequestCache::new();
    service.client_stats(&mut scope, CompanyId(1), w).await.unwrap();
    let mut scope = RequestCache::new();
    service.client_stats(&mut scope, CompanyId(2), w).await.unwrap();
}

#[tokio::test]
async fn test_tracker_observes_widget_fetches() {
    let mut repository = MockRepo::new();
    repository
        .expect_daily_chart()
        .with(always(), always())
        .returning(|_, _| Ok(DailyChartData::default()));
    let service = service(repository);
    let mut scope = RequestCache::new();

    service
        .daily_chart(&mut scope, CompanyId(1), window(1, 1, 1, 7))
        .await
        .unwrap();

    let today = chrono::Utc::now().date_naive();
    let analytics = service
        .tracker()
        .daily_analytics("daily_chart", today)
        .await
        .unwrap()
        .expect("fetch should have been tracked");
    assert_eq!(analytics.count, 1);
    assert!(analytics.min_time_ms <= analytics.max_time_ms);
}

#[tokio::test]
async fn test_scheduling_policy_is_config_driven() {
    let mut config = DashboardConfig::default();
    config.lazy_loading.immediate.push("revenue_summary".to_string());
    config.priority.insert("daily_chart".to_string(), 10);

    let service = DashboardMetricsService::new(
        Arc::new(MockRepo::new()),
        Arc::new(MemoryCacheStore::new()),
        &config,
    );

    assert!(!service.policy().should_lazy_load("revenue_summary"));
    assert!(service.policy().should_lazy_load("daily_chart"));
    assert_eq!(service.policy().priority("daily_chart"), 10);
    assert_eq!(service.policy().priority("unknown"), 99);
}

// ---------------------------------------------------------------------------
// Multi-period equivalence against a concrete in-memory ledger
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct LedgerRow {
    date: NaiveDate,
    total: f64,
    balance: f64,
    status: &'static str,
}

/// Computes invoice aggregates directly from rows, so multi-period
/// results can be checked against independent single-period calls over
/// the same data.
struct FakeLedger {
    rows: Vec<LedgerRow>,
}

impl FakeLedger {
    fn compute(&self, window: &DateWindow) -> InvoiceStatistics {
        let mut stats = InvoiceStatistics::default();
        for row in self
            .rows
            .iter()
            .filter(|row| row.date >= window.start && row.date <= window.end)
        {
            stats.total_amount += row.total;
            stats.invoice_count += 1;
            match row.status {
                "paid" => {
                    stats.paid_amount += row.total;
                    stats.paid_count += 1;
                }
                "sent" => {
                    stats.sent_amount += row.total;
                    stats.sent_count += 1;
                }
                "draft" => {
                    stats.draft_amount += row.total;
                    stats.draft_count += 1;
                }
                _ => {}
            }
            if matches!(row.status, "sent" | "viewed" | "partial") {
                stats.outstanding_amount += row.balance;
            }
        }
        if stats.invoice_count > 0 {
            stats.average_amount = stats.total_amount / stats.invoice_count as f64;
        }
        stats
    }
}

#[async_trait]
impl MetricsRepository for FakeLedger {
    async fn invoice_stats(
        &self,
        _company: CompanyId,
        window: &DateWindow,
    ) -> DashboardResult<InvoiceStatistics> {
        Ok(self.compute(window))
    }

    async fn payment_stats(
        &self,
        _company: CompanyId,
        _window: &DateWindow,
    ) -> DashboardResult<PaymentStatistics> {
        Ok(PaymentStatistics::default())
    }

    async fn client_stats(
        &self,
        _company: CompanyId,
        _window: &DateWindow,
    ) -> DashboardResult<ClientStatistics> {
        Ok(ClientStatistics::default())
    }

    async fn daily_chart(
        &self,
        _company: CompanyId,
        _window: &DateWindow,
    ) -> DashboardResult<DailyChartData> {
        Ok(DailyChartData::default())
    }

    async fn multi_period_invoice_stats(
        &self,
        _company: CompanyId,
        periods: &[LabeledWindow],
    ) -> DashboardResult<Vec<PeriodStatistics>> {
        Ok(periods
            .iter()
            .map(|period| PeriodStatistics {
                label: period.label.clone(),
                stats: self.compute(&period.window),
            })
            .collect())
    }
}

#[tokio::test]
async fn test_multi_period_equals_independent_single_periods() {
    let ledger = FakeLedger {
        rows: vec![
            LedgerRow { date: day(1, 5), total: 100.0, balance: 0.0, status: "paid" },
            LedgerRow { date: day(1, 20), total: 200.0, balance: 200.0, status: "sent" },
            LedgerRow { date: day(2, 2), total: 50.0, balance: 0.0, status: "draft" },
            LedgerRow { date: day(2, 14), total: 300.0, balance: 120.0, status: "partial" },
            LedgerRow { date: day(3, 1), total: 80.0, balance: 80.0, status: "viewed" },
        ],
    };
    let periods = vec![
        LabeledWindow::new("jan", window(1, 1, 1, 31)).unwrap(),
        LabeledWindow::new("feb", window(2, 1, 2, 29)).unwrap(),
        LabeledWindow::new("mar", window(3, 1, 3, 31)).unwrap(),
    ];
    let singles: Vec<InvoiceStatistics> = periods
        .iter()
        .map(|period| ledger.compute(&period.window))
        .collect();

    let service = DashboardMetricsService::new(
        Arc::new(ledger),
        Arc::new(MemoryCacheStore::new()),
        &DashboardConfig::default(),
    );
    let mut scope = RequestCache::new();
    let results = service
        .multi_period_invoice_stats(&mut scope, CompanyId(1), periods.clone())
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    for ((result, period), expected) in results.iter().zip(&periods).zip(&singles) {
        assert_eq!(result.label, period.label);
        assert_eq!(&result.stats, expected);
    }
    // Order follows the input, not any internal map ordering
    assert_eq!(results[0].label, "jan");
    assert_eq!(results[2].label, "mar");
}
