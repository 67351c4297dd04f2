//! Source-specific ingestion pipelines
//!
//! - [`DocumentIngestionService`]: markdown trees → document nodes + reference edges
//! - [`ConfigIngestionService`]: skills / MCP servers / plugins → root-category-item hierarchy

pub mod config;
pub mod documents;
pub mod markdown;

pub use config::{
    ConfigIngestionService, ConfigItem, ConfigSnapshot, ConfigSource, ConfigStats,
    ManifestConfigSource, McpServerRecord, PluginRecord, SkillRecord, StaticConfigSource,
};
pub use documents::{DocumentIngestionOptions, DocumentIngestionService};
pub use markdown::FrontMatter;
