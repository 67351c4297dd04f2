//! Time-to-live cache for adapter results

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::graph::GraphData;

/// Cache policy for one adapter instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Last successful results keyed by a fixed per-adapter key
///
/// Expired entries are evicted lazily on the next lookup.
#[derive(Debug)]
pub struct SourceCache {
    config: CacheConfig,
    entries: Mutex<HashMap<String, (Instant, GraphData)>>,
}

impl SourceCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<GraphData> {
        if !self.config.enabled {
            return None;
        }
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some((stored, data)) if stored.elapsed() <= self.config.ttl => return Some(data.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    pub async fn insert(&self, key: &str, data: GraphData) {
        if !self.config.enabled {
            return;
        }
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (Instant::now(), data));
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
