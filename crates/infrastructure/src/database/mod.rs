//! Tenant data store implementations

pub mod postgres;

pub use postgres::PostgresMetricsRepository;
