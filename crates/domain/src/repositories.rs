//! Tenant data store port
//!
//! The engine only ever issues read-only aggregate queries; row-level CRUD
//! belongs to the surrounding application and is not represented here.

use crate::stats::{
    ClientStatistics, DailyChartData, InvoiceStatistics, PaymentStatistics, PeriodStatistics,
};
use async_trait::async_trait;
use dashboard_core::models::{CompanyId, DateWindow, LabeledWindow};
use dashboard_core::DashboardResult;

/// Read-only aggregate access to the tenant data store.
///
/// Implementations must exclude soft-deleted and archived rows and must
/// return zero-valued aggregates for windows with no matching rows.
#[async_trait]
pub trait MetricsRepository: Send + Sync {
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

    /// Computes every period in one data store pass. Results preserve the
    /// input period order. An empty period list yields an empty Vec
    /// without touching the store.
    async fn multi_period_invoice_stats(
        &self,
        company: CompanyId,
        periods: &[LabeledWindow],
    ) -> DashboardResult<Vec<PeriodStatistics>>;
}
