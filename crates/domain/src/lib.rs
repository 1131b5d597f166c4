pub mod query_builder;
pub mod repositories;
pub mod scheduling;
pub mod stats;

pub use query_builder::{AggregateQueryBuilder, AggregateQueryParam};
pub use repositories::MetricsRepository;
pub use scheduling::WidgetSchedulingPolicy;
pub use stats::{
    ClientStatistics, DailyChartData, DailyChartPoint, InvoiceStatistics, PaymentStatistics,
    PeriodStatistics,
};
