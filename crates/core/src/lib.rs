pub mod config;
pub mod errors;
pub mod logging;
pub mod models;

pub use config::{
    CacheSettings, DashboardConfig, LazyLoadingSettings, PerformanceSettings,
    DEFAULT_PRIORITY,
};
pub use errors::{DashboardError, DashboardResult};
pub use models::{
    CompanyId, ClientId, DateWindow, LabeledWindow, LoadingStrategy, MetricKind,
    WidgetDescriptor,
};
