//! Dashboard metrics engine
//!
//! Computes per-company aggregate statistics (invoices, payments,
//! clients, time-series chart data), serves them through a two-tier
//! cache, and controls how dashboard widgets are scheduled and measured.
//!
//! [`dashboard_core`] carries configuration, errors and value types,
//! [`dashboard_domain`] the pure aggregation and scheduling logic, and
//! [`dashboard_infrastructure`] the cache tiers, the PostgreSQL
//! repository and the performance tracker. This crate wires them into
//! the [`DashboardMetricsService`] facade consumed by request handlers.

pub mod service;

pub use dashboard_core::{
    CompanyId, ClientId, DashboardConfig, DashboardError, DashboardResult, DateWindow,
    LabeledWindow, LoadingStrategy, MetricKind, WidgetDescriptor,
};
pub use dashboard_domain::{
    ClientStatistics, DailyChartData, InvoiceStatistics, MetricsRepository, PaymentStatistics,
    PeriodStatistics, WidgetSchedulingPolicy,
};
pub use dashboard_infrastructure::{
    CacheStore, MemoryCacheStore, PerformanceTracker, PostgresMetricsRepository,
    RedisCacheStore, RequestCache, TwoTierCacheManager,
};
pub use service::DashboardMetricsService;
