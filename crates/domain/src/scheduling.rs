//! Widget scheduling policy
//!
//! Pure decision logic over the configuration tables: whether a widget is
//! lazily loaded, how it is fetched, how long its cache entries live and
//! in which order widgets load. Built once from validated configuration,
//! then consulted without further lookups into raw config keys.

use dashboard_core::config::{DashboardConfig, DEFAULT_PRIORITY};
use dashboard_core::models::{LoadingStrategy, WidgetDescriptor};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WidgetSchedulingPolicy {
    lazy_loading_enabled: bool,
    immediate: HashSet<String>,
    viewport: HashSet<String>,
    deferred: HashSet<String>,
    default_ttl: Duration,
    widget_ttl: HashMap<String, Duration>,
    priorities: HashMap<String, u32>,
}

impl WidgetSchedulingPolicy {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            lazy_loading_enabled: config.lazy_loading.enabled,
            immediate: config.lazy_loading.immediate.iter().cloned().collect(),
            viewport: config.lazy_loading.viewport.iter().cloned().collect(),
            deferred: config.lazy_loading.deferred.iter().cloned().collect(),
            default_ttl: Duration::from_secs(config.cache.default_ttl_seconds),
            widget_ttl: config
                .cache
                .widget_ttl_seconds
                .iter()
                .map(|(widget, seconds)| (widget.clone(), Duration::from_secs(*seconds)))
                .collect(),
            priorities: config.priority.clone(),
        }
    }

    /// Global lazy loading kill switch
    pub fn is_lazy_loading_enabled(&self) -> bool {
        self.lazy_loading_enabled
    }

    /// False when lazy loading is globally disabled or the widget type is
    /// on the immediate-load list.
    pub fn should_lazy_load(&self, widget_type: &str) -> bool {
        self.lazy_loading_enabled && !self.immediate.contains(widget_type)
    }

    /// Viewport is the explicit fallback for types on neither list
    pub fn loading_strategy(&self, widget_type: &str) -> LoadingStrategy {
        if self.deferred.contains(widget_type) {
            LoadingStrategy::OnLoad
        } else if self.viewport.contains(widget_type) {
            LoadingStrategy::Viewport
        } else {
            // explicit fallback for types on neither list
            LoadingStrategy::Viewport
        }
    }

    /// Per-widget TTL override, else the global default
    pub fn cache_ttl(&self, widget_type: &str) -> Duration {
        self.widget_ttl
            .get(widget_type)
            .copied()
            .unwrap_or(self.default_ttl)
    }

    /// Configured priority, else [`DEFAULT_PRIORITY`]; lower loads first
    pub fn priority(&self, widget_type: &str) -> u32 {
        self.priorities
            .get(widget_type)
            .copied()
            .unwrap_or(DEFAULT_PRIORITY)
    }

    /// Stable ascending sort by priority. Widgets with an empty type go
    /// through the same default lookup as any unconfigured type.
    pub fn sort_by_priority(&self, mut widgets: Vec<WidgetDescriptor>) -> Vec<WidgetDescriptor> {
        widgets.sort_by_key(|widget| self.priority(&widget.widget_type));
        widgets
    }
}
