//! PostgreSQL implementation of the metrics repository
//!
//! Executes the SQL produced by the domain query builder. Row mapping
//! relies on every aggregate column being COALESCEd at the source, so a
//! zero-row window decodes into all-zero statistics.

use async_trait::async_trait;
use dashboard_core::models::{CompanyId, DateWindow, LabeledWindow};
use dashboard_core::DashboardResult;
use dashboard_domain::query_builder::{AggregateQueryBuilder, AggregateQueryParam};
use dashboard_domain::repositories::MetricsRepository;
use dashboard_domain::stats::{
    ClientStatistics, DailyChartData, DailyChartPoint, InvoiceStatistics, PaymentStatistics,
    PeriodStatistics,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

pub struct PostgresMetricsRepository {
    pool: PgPool,
}

impl PostgresMetricsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a dedicated pool; callers embedding an existing pool use
    /// [`PostgresMetricsRepository::new`].
    pub async fn connect(database_url: &str, max_connections: u32) -> DashboardResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    fn bind_params<'q>(
        sql: &'q str,
        params: &'q [AggregateQueryParam],
    ) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = match param {
                AggregateQueryParam::Int64(value) => query.bind(value),
                AggregateQueryParam::Date(value) => query.bind(value),
            };
        }
        query
    }

    fn read_invoice_stats(row: &PgRow, prefix: &str) -> DashboardResult<InvoiceStatistics> {
        let column = |name: &str| format!("{prefix}{name}");
        Ok(InvoiceStatistics {
            total_amount: row.try_get(column("total_amount").as_str())?,
            invoice_count: row.try_get(column("invoice_count").as_str())?,
            average_amount: row.try_get(column("average_amount").as_str())?,
            paid_amount: row.try_get(column("paid_amount").as_str())?,
            paid_count: row.try_get(column("paid_count").as_str())?,
            sent_amount: row.try_get(column("sent_amount").as_str())?,
            sent_count: row.try_get(column("sent_count").as_str())?,
            draft_amount: row.try_get(column("draft_amount").as_str())?,
            draft_count: row.try_get(column("draft_count").as_str())?,
            outstanding_amount: row.try_get(column("outstanding_amount").as_str())?,
        })
    }
}

#[async_trait]
impl MetricsRepository for PostgresMetricsRepository {
    #[instrument(skip(self))]
    async fn invoice_stats(
        &self,
        company: CompanyId,
        window: &DateWindow,
    ) -> DashboardResult<InvoiceStatistics> {
        let (sql, params) = AggregateQueryBuilder::invoice_stats_query(company, window);
        let row = Self::bind_params(&sql, &params)
            .fetch_one(&self.pool)
            .await?;
        Self::read_invoice_stats(&row, "")
    }

    #[instrument(skip(self))]
    async fn payment_stats(
        &self,
        company: CompanyId,
        window: &DateWindow,
    ) -> DashboardResult<PaymentStatistics> {
        let (sql, params) = AggregateQueryBuilder::payment_stats_query(company, window);
        let row = Self::bind_params(&sql, &params)
            .fetch_one(&self.pool)
            .await?;
        Ok(PaymentStatistics {
            total_received: row.try_get("total_received")?,
            payment_count: row.try_get("payment_count")?,
            average_payment: row.try_get("average_payment")?,
            refunded_amount: row.try_get("refunded_amount")?,
            refunded_count: row.try_get("refunded_count")?,
        })
    }

    #[instrument(skip(self))]
    async fn client_stats(
        &self,
        company: CompanyId,
        window: &DateWindow,
    ) -> DashboardResult<ClientStatistics> {
        let (sql, params) = AggregateQueryBuilder::client_stats_query(company, window);
        let row = Self::bind_params(&sql, &params)
            .fetch_one(&self.pool)
            .await?;
        Ok(ClientStatistics {
            total_clients: row.try_get("total_clients")?,
            active_clients: row.try_get("active_clients")?,
            new_clients: row.try_get("new_clients")?,
        })
    }

    #[instrument(skip(self))]
    async fn daily_chart(
        &self,
        company: CompanyId,
        window: &DateWindow,
    ) -> DashboardResult<DailyChartData> {
        let (sql, params) = AggregateQueryBuilder::daily_chart_query(company, window);
        let rows = Self::bind_params(&sql, &params)
            .fetch_all(&self.pool)
            .await?;

        let mut points = Vec::with_capacity(rows.len());
        for row in &rows {
            points.push(DailyChartPoint {
                day: row.try_get("day")?,
                invoiced_amount: row.try_get("invoiced_amount")?,
                received_amount: row.try_get("received_amount")?,
                invoice_count: row.try_get("invoice_count")?,
            });
        }
        Ok(DailyChartData { points })
    }

    #[instrument(skip(self, periods))]
    async fn multi_period_invoice_stats(
        &self,
        company: CompanyId,
        periods: &[LabeledWindow],
    ) -> DashboardResult<Vec<PeriodStatistics>> {
        let Some((sql, params)) =
            AggregateQueryBuilder::multi_period_invoice_stats_query(company, periods)
        else {
            return Ok(Vec::new());
        };

        let row = Self::bind_params(&sql, &params)
            .fetch_one(&self.pool)
            .await?;

        let mut results = Vec::with_capacity(periods.len());
        for (i, period) in periods.iter().enumerate() {
            results.push(PeriodStatistics {
                label: period.label.clone(),
                stats: Self::read_invoice_stats(&row, &format!("p{i}_"))?,
            });
        }
        Ok(results)
    }
}
