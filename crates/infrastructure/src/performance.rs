//! Widget load-time tracking and daily analytics
//!
//! Every widget data-fetch reports its elapsed time here. The tracker
//! emits one structured log record per sample on the configured channel,
//! bumps the metrics sink, and folds the sample into a per-day aggregate
//! kept in the persistent cache for 24 hours. Tracking must never fail a
//! widget load, so persistence problems are logged and swallowed.

use crate::cache::{CacheStore, CacheStoreExt};
use chrono::{NaiveDate, Utc};
use dashboard_core::config::PerformanceSettings;
use dashboard_core::DashboardResult;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::keys;

/// Per-day load-time aggregate for one widget type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAnalytics {
    pub count: u64,
    pub total_time_ms: f64,
    pub avg_time_ms: f64,
    pub max_time_ms: f64,
    pub min_time_ms: f64,
}

impl Default for DailyAnalytics {
    fn default() -> Self {
        Self {
            count: 0,
            total_time_ms: 0.0,
            avg_time_ms: 0.0,
            max_time_ms: 0.0,
            // The first sample always wins the minimum
            min_time_ms: f64::MAX,
        }
    }
}

impl DailyAnalytics {
    /// Fold one sample in. The average is recomputed from the running
    /// total rather than updated incrementally, so it cannot drift.
    pub fn record(&mut self, load_time_ms: f64) {
        self.count += 1;
        self.total_time_ms += load_time_ms;
        self.avg_time_ms = self.total_time_ms / self.count as f64;
        if load_time_ms > self.max_time_ms {
            self.max_time_ms = load_time_ms;
        }
        if load_time_ms < self.min_time_ms {
            self.min_time_ms = load_time_ms;
        }
    }
}

/// Records widget load-time samples and maintains daily analytics
pub struct PerformanceTracker {
    store: Arc<dyn CacheStore>,
    settings: PerformanceSettings,
}

impl PerformanceTracker {
    pub fn new(store: Arc<dyn CacheStore>, settings: PerformanceSettings) -> Self {
        Self { store, settings }
    }

    /// Whether a load time in milliseconds crosses the slow threshold
    pub fn is_slow(&self, load_time_ms: f64) -> bool {
        load_time_ms > self.settings.slow_threshold_ms as f64
    }

    /// Record one widget load. No-op when tracking is disabled.
    pub async fn record(
        &self,
        widget_type: &str,
        load_time_seconds: f64,
        metadata: serde_json::Value,
    ) {
        if !self.settings.track_load_times {
            return;
        }

        let load_time_ms = load_time_seconds * 1000.0;
        let is_slow = self.is_slow(load_time_ms);
        let timestamp = Utc::now();

        info!(
            channel = %self.settings.log_channel,
            event = "widget_load",
            widget.type = widget_type,
            load.time_ms = load_time_ms,
            load.slow = is_slow,
            timestamp = %timestamp.to_rfc3339(),
            metadata = %metadata,
            "Widget load time recorded"
        );
        if is_slow {
            warn!(
                channel = %self.settings.log_channel,
                widget.type = widget_type,
                load.time_ms = load_time_ms,
                threshold_ms = self.settings.slow_threshold_ms,
                "Slow widget load"
            );
        }

        counter!("dashboard_widget_loads_total", "widget_type" => widget_type.to_string())
            .increment(1);
        histogram!("dashboard_widget_load_time_ms", "widget_type" => widget_type.to_string())
            .record(load_time_ms);
        if is_slow {
            counter!("dashboard_widget_slow_loads_total", "widget_type" => widget_type.to_string())
                .increment(1);
        }

        self.update_daily_analytics(widget_type, timestamp.date_naive(), load_time_ms)
            .await;
    }

    /// Daily analytics read-back for dashboards and tests
    pub async fn daily_analytics(
        &self,
        widget_type: &str,
        day: NaiveDate,
    ) -> DashboardResult<Option<DailyAnalytics>> {
        self.store
            .get_typed(&keys::analytics_key(widget_type, day))
            .await
    }

    /// Read-modify-write of the day's aggregate. Concurrent writers can
    /// race and lose a sample; analytics are advisory, so last-write-wins
    /// is acceptable here.
    async fn update_daily_analytics(&self, widget_type: &str, day: NaiveDate, load_time_ms: f64) {
        let key = keys::analytics_key(widget_type, day);

        let mut analytics = match self.store.get_typed::<DailyAnalytics>(&key).await {
            Ok(Some(analytics)) => analytics,
            Ok(None) => DailyAnalytics::default(),
            Err(e) => {
                warn!("Analytics read failed for {key}: {e}");
                return;
            }
        };
        analytics.record(load_time_ms);

        let retention = Duration::from_secs(self.settings.analytics_retention_seconds);
        if let Err(e) = self.store.set_typed(&key, &analytics, retention).await {
            warn!("Analytics write failed for {key}: {e}");
        }
    }
}
