//! Core value types shared across the dashboard metrics engine

use crate::config::CacheSettings;
use crate::errors::{DashboardError, DashboardResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identifies the shape of an aggregate result and the query that produces it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    InvoiceStats,
    PaymentStats,
    ClientStats,
    DailyChart,
    MultiPeriodInvoiceStats,
}

impl MetricKind {
    /// Stable token used as the leading cache key segment
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::InvoiceStats => "invoice_stats",
            MetricKind::PaymentStats => "payment_stats",
            MetricKind::ClientStats => "client_stats",
            MetricKind::DailyChart => "daily_chart",
            MetricKind::MultiPeriodInvoiceStats => "multi_period_invoice_stats",
        }
    }

    /// Persistent-tier TTL for this metric. Chart aggregation is the most
    /// expensive query and the least volatile result, so it keeps a longer
    /// TTL than point-in-time stats.
    pub fn ttl(&self, settings: &CacheSettings) -> Duration {
        match self {
            MetricKind::DailyChart => Duration::from_secs(settings.chart_ttl_seconds),
            _ => Duration::from_secs(settings.stats_ttl_seconds),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tenant isolation boundary. Every cached entry and every invalidation
/// is scoped to exactly one company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub i64);

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optional per-client scope within a company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub i64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive calendar-day date range. Sub-day precision is normalized away
/// before the window ever reaches the key scheme; rounding is the caller's
/// job, not hidden here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Rejects windows whose end precedes their start, before any query is
    /// issued.
    pub fn new(start: NaiveDate, end: NaiveDate) -> DashboardResult<Self> {
        if end < start {
            return Err(DashboardError::invalid_window(format!(
                "end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Single-day window
    pub fn single_day(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// One labeled period of a multi-period aggregate request.
/// Labels become result keys, so they must be non-empty and must not use
/// the cache key separator characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledWindow {
    pub label: String,
    pub window: DateWindow,
}

impl LabeledWindow {
    pub fn new(label: impl Into<String>, window: DateWindow) -> DashboardResult<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(DashboardError::invalid_window("empty period label"));
        }
        if label.contains(':') || label.contains('|') {
            return Err(DashboardError::invalid_window(format!(
                "period label '{label}' contains a reserved separator"
            )));
        }
        Ok(Self { label, window })
    }
}

/// A dashboard widget as seen by the cache and scheduling layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetDescriptor {
    pub widget_type: String,
    pub company_id: CompanyId,
    pub client_id: Option<ClientId>,
}

impl WidgetDescriptor {
    pub fn new(widget_type: impl Into<String>, company_id: CompanyId) -> Self {
        Self {
            widget_type: widget_type.into(),
            company_id,
            client_id: None,
        }
    }

    pub fn with_client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }
}

/// How a lazily loaded widget is fetched on the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingStrategy {
    /// Fetch when the widget scrolls into the viewport (the default)
    Viewport,
    /// Fetch after the page load completes
    OnLoad,
}
