//! schemalens CLI - Discover, cache and inspect schema relationships
//!
//! Usage:
//!   schemalens serve [--port <port>]
//!   schemalens refresh --source <id>
//!   schemalens status --source <id>
//!   schemalens graph --source <id>
//!
//! Examples:
//!   schemalens refresh --source sqlite
//!   schemalens graph --source hana > graph.json

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use schemalens::config::Settings;
use schemalens::graph::GraphAssembler;
use schemalens::metadata::MetadataProvider;
use schemalens::service::{shared, CacheQueryService, CacheRefreshService, SharedStore};
use schemalens::store::OntologyCacheStore;
use schemalens::web;

#[derive(Parser)]
#[command(name = "schemalens")]
#[command(about = "Browse a relational schema as an interactive graph")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ./schemalens.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Recompute and swap the relationship cache for a source
    Refresh {
        /// Source id to refresh
        #[arg(short, long)]
        source: String,
    },

    /// Show cache status for a source
    Status {
        /// Source id to inspect
        #[arg(short, long)]
        source: String,
    },

    /// Print the assembled graph payload as JSON
    Graph {
        /// Source id to assemble
        #[arg(short, long)]
        source: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Serve { port } => cmd_serve(settings, port).await,
        Commands::Refresh { source } => cmd_refresh(settings, &source).await,
        Commands::Status { source } => cmd_status(settings, &source).await,
        Commands::Graph { source } => cmd_graph(settings, &source).await,
    }
}

fn load_settings(path: Option<&std::path::Path>) -> Result<Settings, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(Settings::load_from(p)?),
        None => Ok(Settings::load()?),
    }
}

fn open_store(settings: &Settings) -> Result<SharedStore, Box<dyn std::error::Error>> {
    let store = match &settings.cache.path {
        Some(path) => OntologyCacheStore::open_at(path)?,
        None => OntologyCacheStore::open()?,
    };
    Ok(shared(store))
}

async fn cmd_serve(mut settings: Settings, port: Option<u16>) -> ExitCode {
    if let Some(port) = port {
        settings.server.port = port;
    }
    match web::serve(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_refresh(settings: Settings, source: &str) -> ExitCode {
    let result = async {
        let registry: Arc<dyn MetadataProvider> = Arc::new(settings.build_registry()?);
        let store = open_store(&settings)?;
        let service = CacheRefreshService::with_min_confidence(
            registry,
            store,
            settings.discovery.min_confidence,
        );
        let stats = service.refresh(source).await?;
        Ok::<_, Box<dyn std::error::Error>>(stats)
    }
    .await;

    match result {
        Ok(stats) => {
            println!(
                "Refreshed '{}': discovered {}, inserted {}, cleared {}, preserved {} in {:.1}ms",
                source,
                stats.discovered,
                stats.inserted,
                stats.cleared,
                stats.preserved,
                stats.discovery_time_ms
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_status(settings: Settings, source: &str) -> ExitCode {
    let result = async {
        let store = open_store(&settings)?;
        let service = CacheQueryService::new(store);
        let status = service.status(source).await?;
        Ok::<_, Box<dyn std::error::Error>>(status)
    }
    .await;

    match result {
        Ok(status) => {
            println!("Source: {}", source);
            println!("  cache_valid:         {}", status.cache_valid);
            println!("  total_relationships: {}", status.total_relationships);
            println!("  high_confidence:     {}", status.high_confidence);
            println!("  manually_verified:   {}", status.manually_verified);
            match status.last_discovery {
                Some(t) => println!("  last_discovery:      {}", t.format("%Y-%m-%d %H:%M:%S")),
                None => println!("  last_discovery:      never"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_graph(settings: Settings, source: &str) -> ExitCode {
    let result = async {
        let registry = Arc::new(settings.build_registry()?);
        let store = open_store(&settings)?;
        let query = CacheQueryService::new(store);

        let entities = registry.list_entities(source).await?;
        let edges = query.get_edges(source).await?;
        let graph = GraphAssembler::new().assemble(&entities, &edges)?;
        Ok::<_, Box<dyn std::error::Error>>(serde_json::to_string_pretty(&graph)?)
    }
    .await;

    match result {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
