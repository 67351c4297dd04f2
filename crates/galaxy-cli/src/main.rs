//! Galaxy CLI - knowledge graph ingestion and layout

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use galaxy_core::adapters::{register_builtin_adapters, AdapterConfig, AdapterRegistry};
use galaxy_core::config::Config;
use galaxy_core::fs::{FileSystem, LocalFileSystem, ReqwestFetcher};
use galaxy_core::graph::{Node, NodeKind};
use galaxy_core::ingestion::ConfigStats;
use galaxy_core::layout::LayoutAlgorithm;
use galaxy_core::store::{GraphSnapshot, GraphStore, LoadOutcome};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "galaxy")]
#[command(author, version, about = "Knowledge graph ingestion and 3D layout", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a root directory and print the positioned graph
    Load {
        /// Root directory (defaults to GALAXY_ROOT, then config, then ~/.claude)
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Layout algorithm (orbital, force, sphere, spiral, hierarchical)
        #[arg(short, long)]
        layout: Option<LayoutAlgorithm>,
        /// Seed for the random parts of the layout
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Load a root directory and list matching nodes
    Search {
        /// Text matched against title, description, content and tags
        query: String,
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Load, then reload on every document change until Ctrl-C
    Watch {
        #[arg(short, long)]
        root: Option<PathBuf>,
        #[arg(short, long)]
        layout: Option<LayoutAlgorithm>,
    },

    /// Source adapters
    Adapters {
        #[command(subcommand)]
        action: AdapterAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum AdapterAction {
    /// List registered adapters
    List,
    /// Fetch one adapter's data and lay it out
    Fetch {
        /// Adapter name
        name: String,
        /// Read the raw payload from this JSON file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Fetch the raw payload from this URL
        #[arg(short, long)]
        endpoint: Option<String>,
        #[arg(short, long)]
        layout: Option<LayoutAlgorithm>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("galaxy=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Load { root, layout, seed } => {
            cmd_load(root, layout, seed, cli.format, cli.quiet).await
        }
        Commands::Search { query, root } => cmd_search(&query, root, cli.format, cli.quiet).await,
        Commands::Watch { root, layout } => cmd_watch(root, layout, cli.format, cli.quiet).await,
        Commands::Adapters { action } => cmd_adapters(action, cli.format, cli.quiet).await,
        Commands::Config { action } => cmd_config(action, cli.quiet),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Build a store from the saved config with command-line overrides applied
fn open_store(
    root: Option<PathBuf>,
    layout: Option<LayoutAlgorithm>,
    seed: Option<u64>,
) -> anyhow::Result<(Arc<GraphStore>, PathBuf)> {
    let mut config = Config::load()?;
    if let Some(layout) = layout {
        config.layout.algorithm = layout;
    }
    if seed.is_some() {
        config.layout.seed = seed;
    }
    let root = match root {
        Some(root) => root,
        None => config.sources.resolved_root()?,
    };
    let fs: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new());
    Ok((Arc::new(GraphStore::from_config(&config, fs)), root))
}

async fn cmd_load(
    root: Option<PathBuf>,
    layout: Option<LayoutAlgorithm>,
    seed: Option<u64>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let (store, root) = open_store(root, layout, seed)?;
    store.load(&root).await?;

    let snapshot = store.snapshot().await;
    print_snapshot(&snapshot, store.config_stats().await, format, quiet)
}

async fn cmd_search(
    query: &str,
    root: Option<PathBuf>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let (store, root) = open_store(root, None, None)?;
    store.load(&root).await?;

    let hits = store.search(query).await;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hits)?),
        OutputFormat::Text => {
            if hits.is_empty() {
                if !quiet {
                    println!("No nodes match '{}'.", query);
                }
                return Ok(());
            }
            for node in &hits {
                print_node_line(node);
            }
            if !quiet {
                println!("\n{} match(es)", hits.len());
            }
        }
    }
    Ok(())
}

async fn cmd_watch(
    root: Option<PathBuf>,
    layout: Option<LayoutAlgorithm>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let (store, root) = open_store(root, layout, None)?;
    store.load(&root).await?;
    print_snapshot(&*store.snapshot().await, store.config_stats().await, format, quiet)?;

    let mut watcher = store.clone().watch().await?;
    if !quiet && format == OutputFormat::Text {
        println!("\nWatching {} (Ctrl-C to stop)", root.display());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch");
                break;
            }
            reload = watcher.next_reload() => match reload {
                Some(Ok(LoadOutcome::Loaded { .. })) => {
                    print_snapshot(&*store.snapshot().await, store.config_stats().await, format, quiet)?;
                }
                Some(Ok(LoadOutcome::AlreadyLoading)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Reload failed, showing last good graph");
                    if let Some(suggestion) = e.suggestion() {
                        eprintln!("  {}", suggestion);
                    }
                }
                None => break,
            },
        }
    }
    Ok(())
}

async fn cmd_adapters(action: AdapterAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let fs: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new());
    let mut registry = AdapterRegistry::new();
    register_builtin_adapters(&mut registry, fs.clone(), Arc::new(ReqwestFetcher::new()?));

    match action {
        AdapterAction::List => {
            let infos = registry
                .list()
                .into_iter()
                .map(|name| registry.get(name, None).map(|a| a.info()))
                .collect::<Result<Vec<_>, _>>()?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&infos)?),
                OutputFormat::Text => {
                    if !quiet {
                        println!("Registered adapters:\n");
                    }
                    for info in infos {
                        println!("  {:<20} {}", info.name, info.description);
                    }
                }
            }
        }
        AdapterAction::Fetch {
            name,
            file,
            endpoint,
            layout,
        } => {
            let mut adapter_config = AdapterConfig::default().with_cache(config.sources.cache_config());
            adapter_config.file_path = file;
            adapter_config.api_endpoint = endpoint;

            let mut store = GraphStore::from_config(&config, fs);
            if let Some(layout) = layout {
                store = store.with_layout(layout);
            }
            store.load_adapter(&registry, &name, Some(adapter_config)).await?;
            print_snapshot(&*store.snapshot().await, None, format, quiet)?;
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_snapshot(
    snapshot: &GraphSnapshot,
    stats: Option<ConfigStats>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    println!(
        "Loaded {} nodes, {} connections (layout: {})",
        snapshot.nodes.len(),
        snapshot.connections.len(),
        snapshot.layout
    );
    if quiet {
        return Ok(());
    }

    for kind in NodeKind::all() {
        let count = snapshot.nodes.iter().filter(|n| n.kind == *kind).count();
        if count > 0 {
            println!("  {:<10} {}", kind.as_str(), count);
        }
    }
    if !snapshot.omitted.is_empty() {
        println!("  omitted    {} (orbit capacity)", snapshot.omitted.len());
    }
    if let Some(stats) = stats {
        println!(
            "\nConfig: {}/{} skills, {}/{} MCP servers, {}/{} plugins enabled",
            stats.enabled_skills,
            stats.total_skills,
            stats.enabled_mcp_servers,
            stats.total_mcp_servers,
            stats.enabled_plugins,
            stats.total_plugins
        );
    }
    Ok(())
}

fn print_node_line(node: &Node) {
    let [x, y, z] = node.position;
    println!(
        "  [{:<8}] {:<32} ({:>7.2}, {:>7.2}, {:>7.2})  {}",
        node.kind.as_str(),
        node.title,
        x,
        y,
        z,
        node.id
    );
}
