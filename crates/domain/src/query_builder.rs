//! Business logic for building aggregate dashboard queries
//!
//! This abstracts the SQL generation from the infrastructure
//! implementation. Every query binds the company id first and filters
//! soft-deleted and archived rows at the source, so no downstream layer
//! ever sees them.

use chrono::NaiveDate;
use dashboard_core::models::{CompanyId, DateWindow, LabeledWindow};

/// Pure, stateless builder for dashboard aggregate queries
pub struct AggregateQueryBuilder;

/// Query parameter types for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateQueryParam {
    Int64(i64),
    Date(NaiveDate),
}

impl AggregateQueryParam {
    /// SQL type name for this parameter (useful for debugging)
    pub fn type_name(&self) -> &'static str {
        match self {
            AggregateQueryParam::Int64(_) => "BIGINT",
            AggregateQueryParam::Date(_) => "DATE",
        }
    }
}

impl AggregateQueryBuilder {
    /// Single-window invoice aggregate: totals, per-status breakdowns and
    /// the outstanding balance.
    pub fn invoice_stats_query(
        company: CompanyId,
        window: &DateWindow,
    ) -> (String, Vec<AggregateQueryParam>) {
        let query = "SELECT \
            COALESCE(SUM(total), 0)::float8 AS total_amount, \
            COUNT(*) AS invoice_count, \
            COALESCE(AVG(total), 0)::float8 AS average_amount, \
            COALESCE(SUM(total) FILTER (WHERE status = 'paid'), 0)::float8 AS paid_amount, \
            COUNT(*) FILTER (WHERE status = 'paid') AS paid_count, \
            COALESCE(SUM(total) FILTER (WHERE status = 'sent'), 0)::float8 AS sent_amount, \
            COUNT(*) FILTER (WHERE status = 'sent') AS sent_count, \
            COALESCE(SUM(total) FILTER (WHERE status = 'draft'), 0)::float8 AS draft_amount, \
            COUNT(*) FILTER (WHERE status = 'draft') AS draft_count, \
            COALESCE(SUM(balance) FILTER (WHERE status IN ('sent', 'viewed', 'partial')), 0)::float8 AS outstanding_amount \
            FROM invoices \
            WHERE company_id = $1 AND invoice_date BETWEEN $2 AND $3 \
            AND deleted_at IS NULL AND archived_at IS NULL"
            .to_string();

        (query, Self::scope_params(company, window))
    }

    /// Single-window payment aggregate
    pub fn payment_stats_query(
        company: CompanyId,
        window: &DateWindow,
    ) -> (String, Vec<AggregateQueryParam>) {
        let query = "SELECT \
            COALESCE(SUM(amount), 0)::float8 AS total_received, \
            COUNT(*) AS payment_count, \
            COALESCE(AVG(amount), 0)::float8 AS average_payment, \
            COALESCE(SUM(amount) FILTER (WHERE status = 'refunded'), 0)::float8 AS refunded_amount, \
            COUNT(*) FILTER (WHERE status = 'refunded') AS refunded_count \
            FROM payments \
            WHERE company_id = $1 AND payment_date BETWEEN $2 AND $3 \
            AND deleted_at IS NULL"
            .to_string();

        (query, Self::scope_params(company, window))
    }

    /// Client roster aggregate; only `new_clients` is window-bound
    pub fn client_stats_query(
        company: CompanyId,
        window: &DateWindow,
    ) -> (String, Vec<AggregateQueryParam>) {
        let query = "SELECT \
            COUNT(*) AS total_clients, \
            COUNT(*) FILTER (WHERE status = 'active') AS active_clients, \
            COUNT(*) FILTER (WHERE created_at::date BETWEEN $2 AND $3) AS new_clients \
            FROM clients \
            WHERE company_id = $1 AND deleted_at IS NULL AND archived_at IS NULL"
            .to_string();

        (query, Self::scope_params(company, window))
    }

    /// Daily chart query: one row per calendar day of the window, zeros
    /// filled for days without activity.
    pub fn daily_chart_query(
        company: CompanyId,
        window: &DateWindow,
    ) -> (String, Vec<AggregateQueryParam>) {
        let query = "SELECT \
            d.day::date AS day, \
            COALESCE(i.total, 0)::float8 AS invoiced_amount, \
            COALESCE(p.total, 0)::float8 AS received_amount, \
            COALESCE(i.cnt, 0) AS invoice_count \
            FROM generate_series($2::date, $3::date, interval '1 day') AS d(day) \
            LEFT JOIN (\
                SELECT invoice_date AS day, SUM(total)::float8 AS total, COUNT(*) AS cnt \
                FROM invoices \
                WHERE company_id = $1 AND invoice_date BETWEEN $2 AND $3 \
                AND deleted_at IS NULL AND archived_at IS NULL \
                GROUP BY invoice_date\
            ) i ON i.day = d.day::date \
            LEFT JOIN (\
                SELECT payment_date AS day, SUM(amount)::float8 AS total \
                FROM payments \
                WHERE company_id = $1 AND payment_date BETWEEN $2 AND $3 \
                AND deleted_at IS NULL \
                GROUP BY payment_date\
            ) p ON p.day = d.day::date \
            ORDER BY d.day"
            .to_string();

        (query, Self::scope_params(company, window))
    }

    /// Multi-period invoice aggregate computed in ONE table pass.
    ///
    /// Each period contributes a filtered aggregate column set named
    /// `p{index}_*`; the cost of K periods is a single query, never K.
    /// Returns `None` for an empty period list: no query should be issued.
    pub fn multi_period_invoice_stats_query(
        company: CompanyId,
        periods: &[LabeledWindow],
    ) -> Option<(String, Vec<AggregateQueryParam>)> {
        if periods.is_empty() {
            return None;
        }

        let mut columns = Vec::with_capacity(periods.len() * 10);
        let mut params = vec![AggregateQueryParam::Int64(company.0)];

        for (i, period) in periods.iter().enumerate() {
            let start_pos = params.len() + 1;
            let end_pos = params.len() + 2;
            params.push(AggregateQueryParam::Date(period.window.start));
            params.push(AggregateQueryParam::Date(period.window.end));

            let range = format!("invoice_date BETWEEN ${start_pos} AND ${end_pos}");
            columns.push(format!(
                "COALESCE(SUM(total) FILTER (WHERE {range}), 0)::float8 AS p{i}_total_amount"
            ));
            columns.push(format!(
                "COUNT(*) FILTER (WHERE {range}) AS p{i}_invoice_count"
            ));
            columns.push(format!(
                "COALESCE(AVG(total) FILTER (WHERE {range}), 0)::float8 AS p{i}_average_amount"
            ));
            for status in ["paid", "sent", "draft"] {
                columns.push(format!(
                    "COALESCE(SUM(total) FILTER (WHERE status = '{status}' AND {range}), 0)::float8 AS p{i}_{status}_amount"
                ));
                columns.push(format!(
                    "COUNT(*) FILTER (WHERE status = '{status}' AND {range}) AS p{i}_{status}_count"
                ));
            }
            columns.push(format!(
                "COALESCE(SUM(balance) FILTER (WHERE status IN ('sent', 'viewed', 'partial') AND {range}), 0)::float8 AS p{i}_outstanding_amount"
            ));
        }

        // Outer bounds over the union of all periods keep the scan tight
        let min_start = periods.iter().map(|p| p.window.start).min()?;
        let max_end = periods.iter().map(|p| p.window.end).max()?;
        let outer_start = params.len() + 1;
        let outer_end = params.len() + 2;
        params.push(AggregateQueryParam::Date(min_start));
        params.push(AggregateQueryParam::Date(max_end));

        let query = format!(
            "SELECT {} FROM invoices \
            WHERE company_id = $1 AND invoice_date BETWEEN ${outer_start} AND ${outer_end} \
            AND deleted_at IS NULL AND archived_at IS NULL",
            columns.join(", ")
        );

        Some((query, params))
    }

    fn scope_params(company: CompanyId, window: &DateWindow) -> Vec<AggregateQueryParam> {
        vec![
            AggregateQueryParam::Int64(company.0),
            AggregateQueryParam::Date(window.start),
            AggregateQueryParam::Date(window.end),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window(m1: u32, d1: u32, m2: u32, d2: u32) -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2024, m1, d1).unwrap(),
            NaiveDate::from_ymd_opt(2024, m2, d2).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_invoice_query_filters_soft_deleted_rows() {
        let (query, params) =
            AggregateQueryBuilder::invoice_stats_query(CompanyId(7), &window(1, 1, 1, 31));

        assert!(query.contains("deleted_at IS NULL"));
        assert!(query.contains("archived_at IS NULL"));
        assert!(query.contains("company_id = $1"));
        assert_eq!(params.len(), 3);
        assert_eq!(params[0], AggregateQueryParam::Int64(7));
        assert_eq!(params[1].type_name(), "DATE");
        assert_eq!(params[2].type_name(), "DATE");
    }

    #[test]
    fn test_every_aggregate_column_is_coalesced() {
        let (query, _) =
            AggregateQueryBuilder::invoice_stats_query(CompanyId(1), &window(1, 1, 1, 31));
        // SUM and AVG columns must never propagate NULL into arithmetic
        assert_eq!(query.matches("COALESCE(SUM").count(), 5);
        assert_eq!(query.matches("COALESCE(AVG").count(), 1);
    }

    #[test]
    fn test_multi_period_is_single_statement() {
        let periods = vec![
            LabeledWindow::new("jan", window(1, 1, 1, 31)).unwrap(),
            LabeledWindow::new("feb", window(2, 1, 2, 29)).unwrap(),
            LabeledWindow::new("mar", window(3, 1, 3, 31)).unwrap(),
        ];
        let (query, params) =
            AggregateQueryBuilder::multi_period_invoice_stats_query(CompanyId(9), &periods)
                .unwrap();

        // One FROM clause: one pass over the table regardless of K
        assert_eq!(query.matches("FROM invoices").count(), 1);
        assert!(query.contains("p0_total_amount"));
        assert!(query.contains("p2_outstanding_amount"));
        // company + 2 dates per period + 2 outer bounds
        assert_eq!(params.len(), 1 + 3 * 2 + 2);
        assert_eq!(params[0], AggregateQueryParam::Int64(9));
        assert_eq!(
            params.last(),
            Some(&AggregateQueryParam::Date(
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
            ))
        );
    }

    #[test]
    fn test_multi_period_empty_input_builds_no_query() {
        assert!(
            AggregateQueryBuilder::multi_period_invoice_stats_query(CompanyId(1), &[]).is_none()
        );
    }

    #[test]
    fn test_query_text_is_deterministic() {
        let periods = vec![LabeledWindow::new("q1", window(1, 1, 3, 31)).unwrap()];
        let (a, _) =
            AggregateQueryBuilder::multi_period_invoice_stats_query(CompanyId(4), &periods)
                .unwrap();
        let (b, _) =
            AggregateQueryBuilder::multi_period_invoice_stats_query(CompanyId(4), &periods)
                .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_chart_query_spans_whole_window() {
        let (query, params) =
            AggregateQueryBuilder::daily_chart_query(CompanyId(3), &window(1, 1, 1, 7));
        assert!(query.contains("generate_series($2::date, $3::date"));
        assert!(query.contains("ORDER BY d.day"));
        assert_eq!(params.len(), 3);
    }
}
