//! Document ingestion
//!
//! Walks a document tree through the [`FileSystem`] capability, turns every
//! markdown file into a node and resolves the extracted links into
//! `reference` connections.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Component, Path};
use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use super::markdown;
use crate::error::{Error, Result};
use crate::fs::{FileEntry, FileSystem};
use crate::graph::{Connection, ConnectionKind, GraphData, Node};

/// Strength of every document reference edge
pub const REFERENCE_STRENGTH: f32 = 0.8;

type ScanFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<FileEntry>>> + Send + 'a>>;

/// Which files count as documents and which directories are skipped
#[derive(Debug, Clone)]
pub struct DocumentIngestionOptions {
    /// File extension, without the dot
    pub extension: String,
    /// Directory names skipped at every depth
    pub denylist: Vec<String>,
}

impl Default for DocumentIngestionOptions {
    fn default() -> Self {
        Self {
            extension: "md".to_string(),
            denylist: vec!["node_modules".to_string()],
        }
    }
}

/// Builds document nodes and reference connections from a directory tree
pub struct DocumentIngestionService {
    fs: Arc<dyn FileSystem>,
    options: DocumentIngestionOptions,
}

impl DocumentIngestionService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            options: DocumentIngestionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DocumentIngestionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DocumentIngestionOptions {
        &self.options
    }

    /// Ingest every document under `root`
    ///
    /// An unlistable root is `SourceUnavailable`; unreadable or malformed
    /// documents are logged and left out.
    pub async fn ingest(&self, root: &Path) -> Result<GraphData> {
        let files = self.scan(root, true).await?;
        debug!(root = %root.display(), files = files.len(), "Enumerated documents");

        // Reads fan out without a cap
        let reads = join_all(files.iter().map(|entry| async move {
            let raw = self.fs.read_to_string(&entry.path).await;
            (entry, raw)
        }))
        .await;

        let mut nodes = Vec::with_capacity(reads.len());
        for (entry, raw) in reads {
            let raw = match raw {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %entry.path.display(), error = %e, "Skipping unreadable document");
                    continue;
                }
            };
            match build_node(root, entry, &raw) {
                Ok(node) => nodes.push(node),
                Err(e) => warn!(path = %entry.path.display(), error = %e, "Skipping document"),
            }
        }

        let connections = resolve_links(&nodes);
        info!(
            root = %root.display(),
            node_count = nodes.len(),
            connection_count = connections.len(),
            "Ingested documents"
        );

        Ok(GraphData::new(nodes, connections))
    }

    /// Depth-first enumeration, entries in name order
    fn scan<'a>(&'a self, dir: &'a Path, is_root: bool) -> ScanFuture<'a> {
        Box::pin(async move {
            let entries = match self.fs.read_dir(dir).await {
                Ok(entries) => entries,
                Err(e) if is_root => return Err(Error::unavailable(dir.display().to_string(), e)),
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                    return Ok(Vec::new());
                }
            };

            let mut files = Vec::new();
            for entry in entries {
                if entry.is_hidden() {
                    continue;
                }
                if entry.is_dir {
                    if self.options.denylist.iter().any(|d| *d == entry.name) {
                        continue;
                    }
                    files.extend(self.scan(&entry.path, false).await?);
                } else if self.is_document(&entry.name) {
                    files.push(entry);
                }
            }
            Ok(files)
        })
    }

    fn is_document(&self, name: &str) -> bool {
        name.rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && ext == self.options.extension)
    }
}

/// Root-relative, `/`-separated id with a leading `/`
pub fn document_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut id = String::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            id.push('/');
            id.push_str(&part.to_string_lossy());
        }
    }
    if id.is_empty() {
        id.push('/');
    }
    id
}

fn build_node(root: &Path, entry: &FileEntry, raw: &str) -> Result<Node> {
    let (front_matter, body) =
        markdown::split_front_matter(raw).map_err(|reason| Error::FrontMatter {
            path: entry.path.display().to_string(),
            reason,
        })?;

    let id = document_id(root, &entry.path);
    let links = markdown::extract_links(body);
    let kind = markdown::classify(&id, &entry.name, front_matter.kind.as_deref());
    let title = front_matter
        .title
        .clone()
        .or_else(|| markdown::extract_title(body))
        .unwrap_or_else(|| markdown::title_from_file_name(&entry.name));
    let description = front_matter
        .description
        .clone()
        .unwrap_or_else(|| markdown::extract_description(body));
    let importance = markdown::importance(
        body.chars().count(),
        links.len(),
        markdown::heading_count(body),
    );
    let tags = front_matter
        .tags
        .iter()
        .cloned()
        .chain(markdown::extract_hashtags(body));

    Ok(Node::new(id, kind, title)
        .with_description(description)
        .with_source_path(entry.path.display().to_string())
        .with_content(body)
        .with_tags(tags)
        .with_links(links)
        .with_importance(importance)
        .with_size(raw.len() as u64)
        .with_modified(entry.modified))
}

/// Resolve every node's links against the node set
///
/// Nodes are tried in order; the first containment match wins, then the
/// first exact file-name match. Unresolved links, self references and
/// repeated (source, target) pairs produce nothing.
pub fn resolve_links(nodes: &[Node]) -> Vec<Connection> {
    let lowered: Vec<String> = nodes.iter().map(|n| n.id.to_lowercase()).collect();
    let file_names: Vec<&str> = nodes.iter().map(|n| file_name_of(&n.source_path)).collect();

    let mut seen = HashSet::new();
    let mut connections = Vec::new();

    for source in nodes {
        for link in &source.links {
            let Some(target) = find_target(nodes, &lowered, &file_names, link) else {
                continue;
            };
            if target.id == source.id {
                continue;
            }
            if seen.insert((source.id.as_str(), target.id.as_str())) {
                connections.push(
                    Connection::new(&source.id, &target.id, ConnectionKind::Reference)
                        .with_strength(REFERENCE_STRENGTH),
                );
            }
        }
    }
    connections
}

fn find_target<'a>(
    nodes: &'a [Node],
    lowered_ids: &[String],
    file_names: &[&str],
    link: &str,
) -> Option<&'a Node> {
    let normalized = link.replace('\\', "/").to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    if let Some(i) = lowered_ids
        .iter()
        .position(|id| id.contains(&normalized) || normalized.contains(id.as_str()))
    {
        return Some(&nodes[i]);
    }

    let link_file = link.rsplit('/').next().unwrap_or(link);
    if link_file.is_empty() {
        return None;
    }
    file_names
        .iter()
        .position(|name| *name == link_file)
        .map(|i| &nodes[i])
}

fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::graph::NodeKind;

    fn service(fs: MemoryFileSystem) -> DocumentIngestionService {
        DocumentIngestionService::new(Arc::new(fs))
    }

    fn doc(id: &str, links: &[&str]) -> Node {
        Node::new(id, NodeKind::Document, id)
            .with_source_path(format!("/root{}", id))
            .with_links(links.iter().map(|l| l.to_string()).collect())
    }

    #[test]
    fn test_document_id() {
        let root = Path::new("/home/me/.claude");
        assert_eq!(
            document_id(root, Path::new("/home/me/.claude/docs/guide.md")),
            "/docs/guide.md"
        );
        assert_eq!(document_id(root, Path::new("/home/me/.claude/a.md")), "/a.md");
    }

    #[tokio::test]
    async fn test_ingest_skips_hidden_and_denylisted_at_every_depth() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/r/a.md", "# A");
        fs.add_file("/r/.hidden.md", "# Hidden");
        fs.add_file("/r/.git/notes.md", "# Git");
        fs.add_file("/r/node_modules/pkg/README.md", "# Pkg");
        fs.add_file("/r/docs/b.md", "# B");
        fs.add_file("/r/docs/node_modules/c.md", "# C");
        fs.add_file("/r/docs/.cache/d.md", "# D");
        fs.add_file("/r/docs/notes.txt", "not markdown");

        let data = service(fs).ingest(Path::new("/r")).await.unwrap();
        let ids: Vec<_> = data.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["/a.md", "/docs/b.md"]);
    }

    #[tokio::test]
    async fn test_ingest_missing_root_is_unavailable() {
        let err = service(MemoryFileSystem::new())
            .ingest(Path::new("/missing"))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_ingest_builds_node_fields() {
        let fs = MemoryFileSystem::new();
        fs.add_file(
            "/r/guide.md",
            "---\ntags: [intro]\n---\n# Getting Started\n\nWelcome to the #docs.\n\nSee [next](next.md).",
        );
        fs.add_file("/r/next.md", "No heading here");

        let data = service(fs).ingest(Path::new("/r")).await.unwrap();
        let guide = data.node("/guide.md").unwrap();
        assert_eq!(guide.kind, NodeKind::Document);
        assert_eq!(guide.title, "Getting Started");
        assert_eq!(guide.description, "Welcome to the #docs.");
        assert_eq!(guide.tags, vec!["intro", "docs"]);
        assert_eq!(guide.links, vec!["next.md"]);
        assert_eq!(guide.source_path, "/r/guide.md");
        assert!(!guide.content.starts_with("---"));
        assert!(guide.importance > 0.0 && guide.importance <= 1.0);

        let next = data.node("/next.md").unwrap();
        assert_eq!(next.title, "next");
        assert_eq!(next.description, "No heading here");

        assert_eq!(data.connections.len(), 1);
        let conn = &data.connections[0];
        assert_eq!(conn.source, "/guide.md");
        assert_eq!(conn.target, "/next.md");
        assert_eq!(conn.kind, ConnectionKind::Reference);
        assert_eq!(conn.strength, REFERENCE_STRENGTH);
    }

    #[tokio::test]
    async fn test_front_matter_overrides_heading() {
        let fs = MemoryFileSystem::new();
        fs.add_file(
            "/r/x.md",
            "---\ntitle: Declared\ndescription: Declared description\ntype: plugin\n---\n# Heading\nBody",
        );
        let data = service(fs).ingest(Path::new("/r")).await.unwrap();
        let node = &data.nodes[0];
        assert_eq!(node.title, "Declared");
        assert_eq!(node.description, "Declared description");
        assert_eq!(node.kind, NodeKind::Plugin);
    }

    #[tokio::test]
    async fn test_invalid_front_matter_excludes_only_that_document() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/r/bad.md", "---\ntitle: [oops\n---\nbody");
        fs.add_file("/r/good.md", "# Good");
        let data = service(fs).ingest(Path::new("/r")).await.unwrap();
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].id, "/good.md");
    }

    #[tokio::test]
    async fn test_ingest_is_deterministic() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/r/a.md", "# A\nlinks [[b]] #t1");
        fs.add_file("/r/sub/b.md", "# B\nsee [a](a.md)");
        let service = DocumentIngestionService::new(fs);

        let first = service.ingest(Path::new("/r")).await.unwrap();
        let second = service.ingest(Path::new("/r")).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_containment_then_file_name() {
        let nodes = vec![
            doc("/a.md", &["guides/b.md", "c.md", "missing.md"]),
            doc("/guides/b.md", &["../a.md"]),
            doc("/deep/nested/c.md", &[]),
        ];
        let connections = resolve_links(&nodes);
        let pairs: Vec<_> = connections
            .iter()
            .map(|c| (c.source.as_str(), c.target.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("/a.md", "/guides/b.md"),
                ("/a.md", "/deep/nested/c.md"),
                ("/guides/b.md", "/a.md"),
            ]
        );
    }

    #[test]
    fn test_resolve_case_insensitive_skips_self_reference() {
        let nodes = vec![
            doc("/Notes/Plan.md", &[]),
            doc("/x.md", &["notes/plan.md", "other/dir/x.md"]),
        ];
        let connections = resolve_links(&nodes);
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].target, "/Notes/Plan.md");
    }

    #[test]
    fn test_dangling_links_produce_no_connections() {
        let nodes = vec![doc("/a.md", &["nowhere.md", "https://example.com/page"])];
        assert!(resolve_links(&nodes).is_empty());
    }

    #[test]
    fn test_duplicate_targets_emitted_once() {
        let nodes = vec![
            doc("/a.md", &["b.md", "./b.md", "B.md"]),
            doc("/b.md", &[]),
        ];
        let connections = resolve_links(&nodes);
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].id, "/a.md->/b.md");
    }
}
