//! Deterministic cache key derivation
//!
//! Key layout: `<kind-or-widget-type>:<company_id>:<window-suffix>`.
//! The company token always sits in the second `:`-separated segment, so
//! "all keys for company N" is answerable by token inspection without
//! enumerating metric kinds, and tenant-scoped invalidation can maintain
//! a secondary index keyed on that token alone.

use chrono::NaiveDate;
use dashboard_core::models::{ClientId, CompanyId, DateWindow, LabeledWindow, MetricKind};

/// Key for a single-window metric aggregate
pub fn metric_key(kind: MetricKind, company: CompanyId, window: &DateWindow) -> String {
    format!("{}:{}:{}", kind.as_str(), company, window)
}

/// Key for a multi-period invoice aggregate. The suffix encodes the
/// ordered period list, so logically identical requests produce
/// byte-identical keys and any difference in labels, order or bounds
/// produces a different key.
pub fn multi_period_key(company: CompanyId, periods: &[LabeledWindow]) -> String {
    let suffix = periods
        .iter()
        .map(|p| format!("{}:{}", p.label, p.window))
        .collect::<Vec<_>>()
        .join("|");
    format!(
        "{}:{}:{}",
        MetricKind::MultiPeriodInvoiceStats.as_str(),
        company,
        suffix
    )
}

/// Key for widget-level payloads cached outside the metric getters
pub fn widget_key(widget_type: &str, company: CompanyId, client: Option<ClientId>) -> String {
    match client {
        Some(client) => format!("{widget_type}:{company}:{client}"),
        None => format!("{widget_type}:{company}"),
    }
}

/// Prefix matching every key of one widget type, optionally narrowed to a
/// company. Client-level scoping needs an exact-key delete on top of the
/// prefix (see the cache manager), since a bare numeric prefix would also
/// match longer client ids.
pub fn widget_clear_prefix(widget_type: &str, company: Option<CompanyId>) -> String {
    match company {
        Some(company) => format!("{widget_type}:{company}:"),
        None => format!("{widget_type}:"),
    }
}

/// Key for the per-day widget load analytics aggregate
pub fn analytics_key(widget_type: &str, day: NaiveDate) -> String {
    format!("widget_perf:{widget_type}:{day}")
}

/// Secondary index set holding every live key of one company.
/// Maintained on write so tenant invalidation costs are proportional to
/// the company's entry count, not the whole keyspace.
pub fn company_index_key(company: CompanyId) -> String {
    format!("company_keys:{company}")
}

/// Extract the company token from a key, if its second segment is a
/// tenant id. Keys without a numeric second segment (analytics, index
/// keys) are not tenant-scoped.
pub fn company_token(key: &str) -> Option<CompanyId> {
    let token = key.split(':').nth(1)?;
    token.parse::<i64>().ok().map(CompanyId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_key_determinism() {
        let w = window((2024, 1, 1), (2024, 1, 31));
        let a = metric_key(MetricKind::InvoiceStats, CompanyId(42), &w);
        let b = metric_key(MetricKind::InvoiceStats, CompanyId(42), &w);
        assert_eq!(a, b);
        assert_eq!(a, "invoice_stats:42:2024-01-01:2024-01-31");
    }

    #[test]
    fn test_keys_differ_by_kind_company_and_window() {
        let w = window((2024, 1, 1), (2024, 1, 31));
        let base = metric_key(MetricKind::InvoiceStats, CompanyId(42), &w);

        assert_ne!(base, metric_key(MetricKind::PaymentStats, CompanyId(42), &w));
        assert_ne!(base, metric_key(MetricKind::InvoiceStats, CompanyId(43), &w));
        assert_ne!(
            base,
            metric_key(
                MetricKind::InvoiceStats,
                CompanyId(42),
                &window((2024, 1, 1), (2024, 2, 1))
            )
        );
    }

    #[test]
    fn test_company_token_occupies_second_segment() {
        let w = window((2024, 1, 1), (2024, 1, 31));
        for key in [
            metric_key(MetricKind::DailyChart, CompanyId(7), &w),
            multi_period_key(
                CompanyId(7),
                &[LabeledWindow::new("q1", w).unwrap()],
            ),
            widget_key("revenue_summary", CompanyId(7), Some(ClientId(3))),
        ] {
            assert_eq!(company_token(&key), Some(CompanyId(7)));
        }
    }

    #[test]
    fn test_non_tenant_keys_have_no_company_token() {
        assert_eq!(
            company_token(&analytics_key(
                "chart",
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
            )),
            None
        );
        assert_eq!(company_token(&company_index_key(CompanyId(9))), None);
        assert_eq!(company_token("loner"), None);
    }

    #[test]
    fn test_multi_period_key_is_order_sensitive() {
        let q1 = LabeledWindow::new("q1", window((2024, 1, 1), (2024, 3, 31))).unwrap();
        let q2 = LabeledWindow::new("q2", window((2024, 4, 1), (2024, 6, 30))).unwrap();

        let forward = multi_period_key(CompanyId(1), &[q1.clone(), q2.clone()]);
        let reverse = multi_period_key(CompanyId(1), &[q2, q1]);
        assert_ne!(forward, reverse);
    }

    #[test]
    fn test_widget_prefix_scoping() {
        let key = widget_key("daily_chart", CompanyId(42), None);
        assert!(widget_key("daily_chart", CompanyId(42), Some(ClientId(5)))
            .starts_with(&widget_clear_prefix("daily_chart", Some(CompanyId(42)))));
        assert!(key.starts_with(&widget_clear_prefix("daily_chart", None)));
        // A company prefix never matches another company's keys
        assert!(!key.starts_with(&widget_clear_prefix("daily_chart", Some(CompanyId(4)))));
    }
}
