//! Aggregate result shapes served to dashboard widgets
//!
//! All numeric fields default to zero: a successful query over zero
//! matching rows produces an all-zero aggregate, never nulls and never an
//! error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Invoice aggregate for one company and date window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceStatistics {
    pub total_amount: f64,
    pub invoice_count: i64,
    pub average_amount: f64,
    pub paid_amount: f64,
    pub paid_count: i64,
    pub sent_amount: f64,
    pub sent_count: i64,
    pub draft_amount: f64,
    pub draft_count: i64,
    /// Unpaid balance across sent, viewed and partially paid invoices
    pub outstanding_amount: f64,
}

/// Payment aggregate for one company and date window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatistics {
    pub total_received: f64,
    pub payment_count: i64,
    pub average_payment: f64,
    pub refunded_amount: f64,
    pub refunded_count: i64,
}

/// Client roster aggregate for one company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientStatistics {
    pub total_clients: i64,
    pub active_clients: i64,
    /// Clients created within the requested window
    pub new_clients: i64,
}

/// One calendar day of chart data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyChartPoint {
    pub day: NaiveDate,
    pub invoiced_amount: f64,
    pub received_amount: f64,
    pub invoice_count: i64,
}

/// Time-series chart data, one point per day of the window in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyChartData {
    pub points: Vec<DailyChartPoint>,
}

/// One labeled period of a multi-period invoice aggregate.
/// Results preserve the caller's period order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStatistics {
    pub label: String,
    pub stats: InvoiceStatistics,
}
