pub mod cache;
pub mod database;
pub mod performance;

pub use cache::{
    CacheStats, CacheStore, CacheStoreExt, MemoryCacheStore, RedisCacheStore, RequestCache,
    TwoTierCacheManager,
};
pub use database::PostgresMetricsRepository;
pub use performance::{DailyAnalytics, PerformanceTracker};
