//! Source adapters
//!
//! An adapter translates one raw source format into canonical [`GraphData`].
//! Adapters are created on demand by an [`AdapterRegistry`] from a name and
//! an optional [`AdapterConfig`].
//!
//! ## Capabilities
//!
//! Beyond the required `fetch_data` / `parse_*` / `validate_data` contract,
//! adapters may expose optional capabilities. Callers query them explicitly:
//!
//! ```rust,ignore
//! if let Some(stats) = adapter.statistics() {
//!     let summary = stats.statistics().await?;
//! }
//! if let Some(refresher) = adapter.refreshable() {
//!     let ok = refresher.refresh().await;
//! }
//! ```

mod cache;
mod claude_config;
mod graph_json;
mod project_structure;
mod registry;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fs::{FileSystem, HttpFetcher};
use crate::graph::{Connection, ConnectionKind, GraphData, GraphStatistics, Node};

pub use cache::{CacheConfig, SourceCache};
pub use claude_config::ClaudeConfigAdapter;
pub use graph_json::GraphJsonAdapter;
pub use project_structure::ProjectStructureAdapter;
pub use registry::{register_builtin_adapters, AdapterFactory, AdapterRegistry};

/// Where an adapter's raw payload comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Api,
    File,
    Memory,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Descriptive metadata of an adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub source_type: SourceType,
}

/// Per-instance adapter settings
#[derive(Debug, Clone, Default)]
pub struct AdapterConfig {
    pub api_endpoint: Option<String>,
    /// Takes precedence over `api_endpoint` when both are set
    pub file_path: Option<PathBuf>,
    pub cache: CacheConfig,
    pub custom: BTreeMap<String, Value>,
}

impl AdapterConfig {
    pub fn with_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl = ttl;
        self
    }

    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }
}

/// Statistics reported by adapters that support them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterStatistics {
    pub node_count: usize,
    pub connection_count: usize,
    pub categories: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

impl AdapterStatistics {
    pub fn new(stats: GraphStatistics) -> Self {
        Self {
            node_count: stats.node_count,
            connection_count: stats.connection_count,
            categories: stats.categories,
            last_updated: Utc::now(),
        }
    }
}

/// Translates one raw source kind into canonical graph data
#[async_trait]
pub trait DataSourceAdapter: Send + Sync {
    fn info(&self) -> AdapterInfo;

    /// Fetch, validate and transform the source
    ///
    /// Read or transport failures are `SourceUnavailable`; a payload failing
    /// [`DataSourceAdapter::validate_data`] is `InvalidSourceFormat`.
    async fn fetch_data(&self) -> Result<GraphData>;

    fn parse_node(&self, raw: &Value) -> Result<Node>;

    fn parse_connection(&self, raw: &Value) -> Result<Connection> {
        parse_connection_record(raw)
    }

    /// Structural check only: required arrays are present and are arrays
    fn validate_data(&self, raw: &Value) -> bool {
        has_arrays(raw, &["nodes", "connections"])
    }

    fn statistics(&self) -> Option<&dyn StatisticsProvider> {
        None
    }

    fn refreshable(&self) -> Option<&dyn Refreshable> {
        None
    }
}

/// Optional capability: summary counts of the adapter's data
#[async_trait]
pub trait StatisticsProvider: Send + Sync {
    async fn statistics(&self) -> Result<AdapterStatistics>;
}

/// Optional capability: drop cached data and re-fetch
#[async_trait]
pub trait Refreshable: Send + Sync {
    /// Returns whether the re-fetch succeeded; failures are logged, never raised
    async fn refresh(&self) -> bool;
}

/// Whether `raw` is an object whose every listed key holds an array
pub fn has_arrays(raw: &Value, keys: &[&str]) -> bool {
    raw.as_object()
        .is_some_and(|obj| keys.iter().all(|k| obj.get(*k).is_some_and(Value::is_array)))
}

/// Parse a `{ source, target, type|kind, strength?, id? }` record
///
/// Unknown relationship types become `related`.
pub fn parse_connection_record(raw: &Value) -> Result<Connection> {
    let field = |key: &str| raw.get(key).and_then(Value::as_str);

    let source = field("source")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidConnection(format!("missing source in {}", raw)))?;
    let target = field("target")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidConnection(format!("missing target in {}", raw)))?;
    let kind = field("type")
        .or_else(|| field("kind"))
        .and_then(ConnectionKind::parse)
        .unwrap_or(ConnectionKind::Related);

    let mut connection = Connection::new(source, target, kind);
    if let Some(strength) = raw.get("strength").and_then(Value::as_f64) {
        connection = connection.with_strength(strength as f32);
    }
    if let Some(id) = field("id") {
        connection = connection.with_id(id);
    }
    Ok(connection)
}

/// Parse every element of `raw[key]`, logging and skipping failures
pub(crate) fn parse_each<T>(
    adapter: &str,
    raw: &Value,
    key: &str,
    parse: impl Fn(&Value) -> Result<T>,
) -> Vec<T> {
    let Some(items) = raw.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match parse(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(adapter, key, index, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}

/// Resolves an adapter's raw payload from its configured file or endpoint
pub(crate) struct RawSource {
    fs: Arc<dyn FileSystem>,
    http: Arc<dyn HttpFetcher>,
    file_path: Option<PathBuf>,
    api_endpoint: Option<String>,
}

impl RawSource {
    pub(crate) fn new(
        fs: Arc<dyn FileSystem>,
        http: Arc<dyn HttpFetcher>,
        config: &AdapterConfig,
    ) -> Self {
        Self {
            fs,
            http,
            file_path: config.file_path.clone(),
            api_endpoint: config.api_endpoint.clone(),
        }
    }

    pub(crate) fn source_type(&self) -> SourceType {
        if self.file_path.is_some() {
            SourceType::File
        } else {
            SourceType::Api
        }
    }

    pub(crate) async fn fetch(&self, adapter: &str) -> Result<Value> {
        if let Some(path) = &self.file_path {
            debug!(adapter, path = %path.display(), "Reading source file");
            let raw = self
                .fs
                .read_to_string(path)
                .await
                .map_err(|e| Error::unavailable(path.display().to_string(), e))?;
            return serde_json::from_str(&raw).map_err(|e| {
                Error::InvalidSourceFormat(format!("{}: {}", path.display(), e))
            });
        }

        if let Some(endpoint) = &self.api_endpoint {
            return self.http.get_json(endpoint).await;
        }

        Err(Error::unavailable(
            adapter,
            "no file path or API endpoint configured",
        ))
    }
}
