//! Name → factory registry for source adapters

use std::sync::Arc;

use tracing::warn;

use super::{
    AdapterConfig, ClaudeConfigAdapter, DataSourceAdapter, GraphJsonAdapter,
    ProjectStructureAdapter,
};
use crate::error::{Error, Result};
use crate::fs::{FileSystem, HttpFetcher};

/// Builds a fresh adapter instance from an optional config
pub type AdapterFactory =
    Arc<dyn Fn(Option<AdapterConfig>) -> Box<dyn DataSourceAdapter> + Send + Sync>;

/// Registry of adapter factories
///
/// Holds no data: every `get` constructs a new instance. Names are listed in
/// registration order.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    factories: Vec<(String, AdapterFactory)>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory; an existing name is replaced in place
    pub fn register(&mut self, name: impl Into<String>, factory: AdapterFactory) {
        let name = name.into();
        if let Some(slot) = self.factories.iter_mut().find(|(n, _)| *n == name) {
            warn!(adapter = %name, "Adapter already registered, overwriting");
            slot.1 = factory;
            return;
        }
        self.factories.push((name, factory));
    }

    pub fn get(&self, name: &str, config: Option<AdapterConfig>) -> Result<Box<dyn DataSourceAdapter>> {
        self.factories
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, factory)| factory(config))
            .ok_or_else(|| Error::UnknownAdapter(name.to_string()))
    }

    pub fn list(&self) -> Vec<&str> {
        self.factories.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.factories.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.list())
            .finish()
    }
}

/// Register `claude-config`, `project-structure` and `graph-json`
pub fn register_builtin_adapters(
    registry: &mut AdapterRegistry,
    fs: Arc<dyn FileSystem>,
    http: Arc<dyn HttpFetcher>,
) {
    {
        let (fs, http) = (fs.clone(), http.clone());
        registry.register(
            "claude-config",
            Arc::new(move |config: Option<AdapterConfig>| {
                Box::new(ClaudeConfigAdapter::new(
                    fs.clone(),
                    http.clone(),
                    config.unwrap_or_default(),
                )) as Box<dyn DataSourceAdapter>
            }),
        );
    }
    {
        let (fs, http) = (fs.clone(), http.clone());
        registry.register(
            "project-structure",
            Arc::new(move |config: Option<AdapterConfig>| {
                Box::new(ProjectStructureAdapter::new(
                    fs.clone(),
                    http.clone(),
                    config.unwrap_or_default(),
                )) as Box<dyn DataSourceAdapter>
            }),
        );
    }
    registry.register(
        "graph-json",
        Arc::new(move |config: Option<AdapterConfig>| {
            Box::new(GraphJsonAdapter::new(
                fs.clone(),
                http.clone(),
                config.unwrap_or_default(),
            )) as Box<dyn DataSourceAdapter>
        }),
    );
}
