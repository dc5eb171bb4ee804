use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use http::Method;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use offline_cache::cache::{CacheStore, DiskCacheStore, GenerationStats};
use offline_cache::config::AgentConfig;
use offline_cache::host::LoggingHost;
use offline_cache::logging::{init_subscriber, LogFormat};
use offline_cache::network::{HttpNetwork, Network};
use offline_cache::request::Request;
use offline_cache::{FetchOutcome, LifecycleHandler, OfflineCacheAgent};

/// Offline cache agent - drive install, activate and fetch against a disk store
#[derive(Parser, Debug)]
#[command(name = "offline-cache")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (compiled defaults if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root directory of the cache store, overrides the config file
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pre-cache the manifest into the current generation
    Install,
    /// Delete every generation except the current one
    Activate,
    /// Request a path or URL through the agent, body goes to stdout
    Fetch {
        /// Absolute path (resolved against the origin) or URL
        target: String,

        /// Request method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Write the body to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List cache generations
    Generations,
}

#[derive(Serialize)]
struct GenerationListing {
    name: String,
    current: bool,
    #[serde(flatten)]
    stats: GenerationStats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_subscriber(format)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize logging subsystem")?;

    let mut config = match &args.config {
        Some(path) => AgentConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AgentConfig::default(),
    };
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = dir.to_string_lossy().into_owned();
    }

    tracing::info!(
        generation = %config.cache_name,
        origin = %config.origin,
        manifest_entries = config.manifest.len(),
        cache_dir = %config.cache_dir,
        "Configuration loaded"
    );

    let store = Arc::new(DiskCacheStore::new(&config.cache_dir));
    let network = Arc::new(HttpNetwork::new()?);
    let agent = OfflineCacheAgent::new(
        config.clone(),
        store.clone(),
        network.clone(),
        Arc::new(LoggingHost),
    )?;

    match args.command {
        Command::Install => {
            let report = agent.on_install().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Activate => {
            let report = agent.on_activate().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_clean() {
                bail!("{} stale generation(s) could not be deleted", report.failed.len());
            }
        }
        Command::Fetch {
            target,
            method,
            output,
        } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("Invalid method {}", method))?;
            let request = Request::new(method, config.resolve(&target)?);

            let response = match agent.on_fetch(&request).await {
                FetchOutcome::PassThrough => {
                    // The host sends requests the agent does not handle
                    network.fetch(&request).await?
                }
                FetchOutcome::FromCache(response) => {
                    tracing::info!(url = %request.url, source = "cache", status = %response.status, "Fetched");
                    response
                }
                FetchOutcome::FromNetwork { response, stored } => {
                    tracing::info!(url = %request.url, source = "network", stored, status = %response.status, "Fetched");
                    response
                }
                FetchOutcome::NetworkFailed(e) => return Err(e.into()),
            };

            match output {
                Some(path) => tokio::fs::write(&path, &response.body)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => std::io::stdout().write_all(&response.body)?,
            }
        }
        Command::Generations => {
            let mut listing = Vec::new();
            for name in store.keys().await? {
                let stats = store.stats(&name).await?;
                listing.push(GenerationListing {
                    current: name == config.cache_name,
                    name,
                    stats,
                });
            }
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }

    Ok(())
}
