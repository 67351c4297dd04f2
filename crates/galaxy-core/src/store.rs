//! Aggregation store
//!
//! Merges document and config ingestion, runs the selected layout and
//! publishes the positioned graph as an immutable [`GraphSnapshot`]. Readers
//! clone an `Arc` and never observe a partially replaced graph.
//!
//! A single in-flight flag guards loads: a `load`, `reload_documents` or
//! `load_adapter` started while another one runs returns
//! [`LoadOutcome::AlreadyLoading`] without touching state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::adapters::{AdapterConfig, AdapterRegistry};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fs::{ChangeKind, FileChangeEvent, FileSystem};
use crate::graph::{Connection, GraphData, Node};
use crate::ingestion::{
    ConfigIngestionService, ConfigSnapshot, ConfigSource, ConfigStats, DocumentIngestionService,
    ManifestConfigSource,
};
use crate::layout::{compute_layout, LayoutAlgorithm, LayoutOptions};

/// Positioned graph exposed to renderers
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    pub layout: LayoutAlgorithm,
    /// Ids the layout left out because of a capacity limit
    pub omitted: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl GraphSnapshot {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Result of a load attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded {
        node_count: usize,
        connection_count: usize,
    },
    /// Another load was in flight; nothing changed
    AlreadyLoading,
}

#[derive(Default)]
struct StoreState {
    snapshot: Arc<GraphSnapshot>,
    layout: LayoutAlgorithm,
    root: Option<PathBuf>,
    /// Last ingestion outputs, pre-layout
    documents: GraphData,
    config: GraphData,
    config_snapshot: Option<ConfigSnapshot>,
    last_error: Option<String>,
}

/// Clears the in-flight flag when dropped, including on early return
struct LoadGuard<'a>(&'a AtomicBool);

impl<'a> LoadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct GraphStore {
    fs: Arc<dyn FileSystem>,
    documents: DocumentIngestionService,
    config: ConfigIngestionService,
    layout_options: LayoutOptions,
    debounce: Duration,
    fallback_to_sample: bool,
    loading: AtomicBool,
    state: RwLock<StoreState>,
}

impl GraphStore {
    pub fn new(fs: Arc<dyn FileSystem>, config_source: Arc<dyn ConfigSource>) -> Self {
        Self {
            documents: DocumentIngestionService::new(fs.clone()),
            config: ConfigIngestionService::new(config_source),
            fs,
            layout_options: LayoutOptions::default(),
            debounce: Duration::from_millis(300),
            fallback_to_sample: false,
            loading: AtomicBool::new(false),
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Store reading manifests from `fs`, set up from the user's configuration
    pub fn from_config(config: &Config, fs: Arc<dyn FileSystem>) -> Self {
        let source = Arc::new(ManifestConfigSource::new(fs.clone()));
        Self::new(fs, source)
            .with_layout(config.layout.algorithm)
            .with_layout_options(config.layout.options())
            .with_debounce(Duration::from_millis(config.watch.debounce_ms))
            .with_sample_fallback(config.sources.fallback_to_sample_config)
    }

    pub fn with_layout(mut self, algorithm: LayoutAlgorithm) -> Self {
        self.state.get_mut().layout = algorithm;
        self
    }

    pub fn with_layout_options(mut self, options: LayoutOptions) -> Self {
        self.layout_options = options;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Substitute [`ConfigSnapshot::sample`] when the config source is unavailable
    pub fn with_sample_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_sample = enabled;
        self
    }

    pub async fn snapshot(&self) -> Arc<GraphSnapshot> {
        self.state.read().await.snapshot.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn layout(&self) -> LayoutAlgorithm {
        self.state.read().await.layout
    }

    pub async fn root(&self) -> Option<PathBuf> {
        self.state.read().await.root.clone()
    }

    pub async fn config_stats(&self) -> Option<ConfigStats> {
        self.state.read().await.config_snapshot.as_ref().map(|s| s.stats())
    }

    /// Ingest documents and config under `root` concurrently, merge and lay out
    ///
    /// On failure the previous graph is kept and `last_error` is set.
    pub async fn load(&self, root: &Path) -> Result<LoadOutcome> {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            info!(root = %root.display(), "Load already in flight, ignoring");
            return Ok(LoadOutcome::AlreadyLoading);
        };
        info!(root = %root.display(), "Loading graph");

        let (documents, config) = tokio::join!(self.documents.ingest(root), self.load_config(root));
        let (documents, (config_snapshot, config)) = match (documents, config) {
            (Ok(documents), Ok(config)) => (documents, config),
            (Err(e), _) | (_, Err(e)) => return Err(self.fail(e).await),
        };

        let mut state = self.state.write().await;
        state.root = Some(root.to_path_buf());
        state.documents = documents;
        state.config = config;
        state.config_snapshot = Some(config_snapshot);
        state.last_error = None;
        Ok(self.publish(&mut state))
    }

    /// Re-ingest documents for the last loaded root and re-merge them with the
    /// last config output; config is not re-read
    pub async fn reload_documents(&self) -> Result<LoadOutcome> {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            debug!("Load in flight, skipping document reload");
            return Ok(LoadOutcome::AlreadyLoading);
        };
        let root = self
            .state
            .read()
            .await
            .root
            .clone()
            .ok_or_else(|| Error::InvalidInput("no root has been loaded".to_string()))?;

        let documents = match self.documents.ingest(&root).await {
            Ok(documents) => documents,
            Err(e) => return Err(self.fail(e).await),
        };

        let mut state = self.state.write().await;
        state.documents = documents;
        state.last_error = None;
        let outcome = self.publish(&mut state);
        info!(root = %root.display(), "Documents reloaded");
        Ok(outcome)
    }

    /// Replace the graph with one adapter's output
    pub async fn load_adapter(
        &self,
        registry: &AdapterRegistry,
        name: &str,
        config: Option<AdapterConfig>,
    ) -> Result<LoadOutcome> {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            return Ok(LoadOutcome::AlreadyLoading);
        };
        let adapter = registry.get(name, config)?;

        let data = match adapter.fetch_data().await {
            Ok(data) => data,
            Err(e) => return Err(self.fail(e).await),
        };
        info!(adapter = name, node_count = data.nodes.len(), "Adapter data fetched");

        let mut state = self.state.write().await;
        state.root = None;
        state.documents = data;
        state.config = GraphData::default();
        state.config_snapshot = None;
        state.last_error = None;
        Ok(self.publish(&mut state))
    }

    /// Switch algorithm and recompute positions over the current graph
    pub async fn set_layout(&self, algorithm: LayoutAlgorithm) {
        let mut state = self.state.write().await;
        state.layout = algorithm;
        self.publish(&mut state);
    }

    /// Case-insensitive match over title, description, content and tags;
    /// a blank query returns every node
    pub async fn search(&self, query: &str) -> Vec<Node> {
        let snapshot = self.snapshot().await;
        if query.trim().is_empty() {
            return snapshot.nodes.clone();
        }
        snapshot.nodes.iter().filter(|n| n.matches(query)).cloned().collect()
    }

    /// Watch the last loaded root and reload documents after each burst of changes
    pub async fn watch(self: Arc<Self>) -> Result<StoreWatcher> {
        let root = self
            .root()
            .await
            .ok_or_else(|| Error::InvalidInput("load a root before watching it".to_string()))?;
        let mut watch = self.fs.watch(&root).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        let debounce = self.debounce;
        let extension = self.documents.options().extension.clone();

        let handle = tokio::spawn(async move {
            while let Some(event) = watch.recv().await {
                if !is_document_event(&event, &extension) {
                    continue;
                }
                debug!(kind = %event.kind, path = %event.path.display(), "Change detected");

                // Let the burst settle
                let mut closed = false;
                loop {
                    match tokio::time::timeout(debounce, watch.recv()).await {
                        Ok(Some(_)) => continue,
                        Ok(None) => {
                            closed = true;
                            break;
                        }
                        Err(_) => break,
                    }
                }

                let result = self.reload_documents().await;
                if let Err(e) = &result {
                    error!(error = %e, "Document reload failed");
                }
                if tx.send(result).is_err() || closed {
                    break;
                }
            }
            debug!("Store watcher stopped");
        });

        info!(root = %root.display(), "Watching for document changes");
        Ok(StoreWatcher { handle, updates: rx })
    }

    async fn load_config(&self, root: &Path) -> Result<(ConfigSnapshot, GraphData)> {
        match self.config.load(root).await {
            Err(e) if self.fallback_to_sample && e.is_unavailable() => {
                warn!(error = %e, "Config source unavailable, using sample config");
                let snapshot = ConfigSnapshot::sample();
                let graph = ConfigIngestionService::ingest(&snapshot);
                Ok((snapshot, graph))
            }
            other => other,
        }
    }

    async fn fail(&self, e: Error) -> Error {
        error!(error = %e, "Load failed, keeping previous graph");
        self.state.write().await.last_error = Some(e.to_string());
        e
    }

    /// Merge, lay out and swap in a new snapshot
    fn publish(&self, state: &mut StoreState) -> LoadOutcome {
        let merged = GraphData::merge([state.config.clone(), state.documents.clone()]);
        let result = compute_layout(
            state.layout,
            &merged.nodes,
            &merged.connections,
            &self.layout_options,
        );

        let mut connections = merged.connections;
        connections.retain(|c| result.index.contains_key(&c.source) && result.index.contains_key(&c.target));

        let snapshot = GraphSnapshot {
            nodes: result.nodes,
            connections,
            layout: state.layout,
            omitted: result.omitted,
            index: result.index,
        };
        let outcome = LoadOutcome::Loaded {
            node_count: snapshot.nodes.len(),
            connection_count: snapshot.connections.len(),
        };
        info!(
            layout = %state.layout,
            node_count = snapshot.nodes.len(),
            connection_count = snapshot.connections.len(),
            "Graph published"
        );
        state.snapshot = Arc::new(snapshot);
        outcome
    }
}

fn is_document_event(event: &FileChangeEvent, extension: &str) -> bool {
    match event.kind {
        ChangeKind::AddDir | ChangeKind::UnlinkDir => true,
        _ => event
            .path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(extension)),
    }
}

/// Keeps a store's watch task alive; dropping it stops the task
pub struct StoreWatcher {
    handle: JoinHandle<()>,
    updates: mpsc::UnboundedReceiver<Result<LoadOutcome>>,
}

impl StoreWatcher {
    /// Wait for the outcome of the next reload; `None` once watching stopped
    pub async fn next_reload(&mut self) -> Option<Result<LoadOutcome>> {
        self.updates.recv().await
    }
}

impl Drop for StoreWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
