//! Dashboard configuration model and loader
//!
//! Every policy knob the engine consults lives here: cache TTLs, lazy
//! loading lists, widget priorities and performance tracking settings.
//! Missing keys always resolve to the documented defaults; absent
//! configuration is never a fatal condition.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Priority assigned to widget types without an explicit entry
/// (lower value = higher priority).
pub const DEFAULT_PRIORITY: u32 = 99;

/// Top-level dashboard engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub cache: CacheSettings,
    pub lazy_loading: LazyLoadingSettings,
    pub performance: PerformanceSettings,
    /// Widget load priority by widget type, lower loads first
    pub priority: HashMap<String, u32>,
}

/// Persistent cache tier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Whether the persistent tier is enabled at all
    pub enabled: bool,
    /// Redis connection URL
    pub redis_url: String,
    /// Key prefix for this deployment
    pub key_prefix: Option<String>,
    /// Default TTL for widget-level cache entries in seconds
    pub default_ttl_seconds: u64,
    /// TTL for point-in-time aggregate stats in seconds
    pub stats_ttl_seconds: u64,
    /// TTL for time-series chart data in seconds
    pub chart_ttl_seconds: u64,
    /// Per-widget TTL overrides in seconds
    pub widget_ttl_seconds: HashMap<String, u64>,
    /// Connection timeout in seconds
    pub connection_timeout_seconds: u64,
    /// Command timeout in seconds
    pub command_timeout_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: Some("dashboard".to_string()),
            default_ttl_seconds: 300,
            stats_ttl_seconds: 60,
            chart_ttl_seconds: 300,
            widget_ttl_seconds: HashMap::new(),
            connection_timeout_seconds: 5,
            command_timeout_seconds: 3,
        }
    }
}

impl CacheSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.enabled {
            if self.redis_url.is_empty() {
                return Err(anyhow::anyhow!("Redis URL cannot be empty"));
            }
            if !self.redis_url.starts_with("redis://") && !self.redis_url.starts_with("rediss://") {
                return Err(anyhow::anyhow!(
                    "Redis URL must start with redis:// or rediss://"
                ));
            }
        }
        if self.default_ttl_seconds == 0 {
            return Err(anyhow::anyhow!("Default TTL must be greater than 0"));
        }
        if self.stats_ttl_seconds == 0 {
            return Err(anyhow::anyhow!("Stats TTL must be greater than 0"));
        }
        if self.chart_ttl_seconds == 0 {
            return Err(anyhow::anyhow!("Chart TTL must be greater than 0"));
        }
        for (widget, ttl) in &self.widget_ttl_seconds {
            if *ttl == 0 {
                return Err(anyhow::anyhow!(
                    "Widget TTL for '{widget}' must be greater than 0"
                ));
            }
        }
        Ok(())
    }
}

/// Widget lazy loading policy lists
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyLoadingSettings {
    /// Global kill switch for lazy loading
    pub enabled: bool,
    /// Widget types always loaded with the initial page
    pub immediate: Vec<String>,
    /// Widget types fetched when scrolled into the viewport
    pub viewport: Vec<String>,
    /// Widget types deferred until after page load
    pub deferred: Vec<String>,
}

impl Default for LazyLoadingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            immediate: Vec::new(),
            viewport: Vec::new(),
            deferred: Vec::new(),
        }
    }
}

impl LazyLoadingSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        for list in [&self.immediate, &self.viewport, &self.deferred] {
            if list.iter().any(|t| t.is_empty()) {
                return Err(anyhow::anyhow!(
                    "Lazy loading lists must not contain empty widget types"
                ));
            }
        }
        for widget in &self.deferred {
            if self.viewport.contains(widget) {
                return Err(anyhow::anyhow!(
                    "Widget '{widget}' cannot be both deferred and viewport"
                ));
            }
        }
        Ok(())
    }
}

/// Widget load-time tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSettings {
    /// Whether widget load times are tracked at all
    pub track_load_times: bool,
    /// Loads slower than this are flagged in telemetry, in milliseconds
    pub slow_threshold_ms: u64,
    /// Named log channel for load-time records
    pub log_channel: String,
    /// Retention for daily analytics aggregates in seconds
    pub analytics_retention_seconds: u64,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            track_load_times: true,
            slow_threshold_ms: 1000,
            log_channel: "performance".to_string(),
            analytics_retention_seconds: 86_400,
        }
    }
}

impl PerformanceSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.slow_threshold_ms == 0 {
            return Err(anyhow::anyhow!("Slow threshold must be greater than 0"));
        }
        if self.analytics_retention_seconds == 0 {
            return Err(anyhow::anyhow!(
                "Analytics retention must be greater than 0"
            ));
        }
        Ok(())
    }
}

impl DashboardConfig {
    /// Load configuration from an optional TOML file with
    /// `DASHBOARD__`-prefixed environment variable overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix("DASHBOARD").separator("__"));

        let config: DashboardConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.cache.validate()?;
        self.lazy_loading.validate()?;
        self.performance.validate()?;
        Ok(())
    }

    /// Priority for a widget type, falling back to [`DEFAULT_PRIORITY`]
    pub fn widget_priority(&self, widget_type: &str) -> u32 {
        self.priority.get(widget_type).copied().unwrap_or(DEFAULT_PRIORITY)
    }
}
