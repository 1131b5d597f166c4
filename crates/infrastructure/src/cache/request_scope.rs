//! Request-local cache tier
//!
//! One `RequestCache` is created at the start of a processing unit
//! (dashboard request or scheduled task), passed by mutable reference
//! into the cache manager, and dropped with the unit. It is never shared
//! across concurrent units, so it needs no synchronization, and its
//! entries have no TTL: they are valid until the unit ends or an
//! invalidation clears them.

use dashboard_core::{DashboardError, DashboardResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct RequestCache {
    entries: HashMap<String, serde_json::Value>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_typed<T: DeserializeOwned>(&self, key: &str) -> DashboardResult<Option<T>> {
        match self.entries.get(key) {
            Some(value) => {
                let typed = serde_json::from_value(value.clone())
                    .map_err(|e| DashboardError::Serialization(e.to_string()))?;
                Ok(Some(typed))
            }
            None => Ok(None),
        }
    }

    pub fn insert<T: Serialize>(&mut self, key: &str, value: &T) -> DashboardResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| DashboardError::Serialization(e.to_string()))?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every entry whose key starts with `prefix`, returning how
    /// many were dropped.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_clear() {
        let mut scope = RequestCache::new();
        scope.insert("invoice_stats:1:a:b", &vec![1, 2, 3]).unwrap();
        assert!(scope.contains("invoice_stats:1:a:b"));
        assert_eq!(
            scope.get_typed::<Vec<i32>>("invoice_stats:1:a:b").unwrap(),
            Some(vec![1, 2, 3])
        );

        scope.clear();
        assert!(scope.is_empty());
        assert_eq!(
            scope.get_typed::<Vec<i32>>("invoice_stats:1:a:b").unwrap(),
            None
        );
    }

    #[test]
    fn test_remove_prefix_is_scoped() {
        let mut scope = RequestCache::new();
        scope.insert("daily_chart:1:w", &1).unwrap();
        scope.insert("daily_chart:2:w", &2).unwrap();
        scope.insert("invoice_stats:1:w", &3).unwrap();

        assert_eq!(scope.remove_prefix("daily_chart:1:"), 1);
        assert_eq!(scope.len(), 2);
        assert!(scope.contains("invoice_stats:1:w"));
    }
}
