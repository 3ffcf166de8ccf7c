//! Keel cache node
//!
//! Loads the entity metadata and dynamic attribute definitions from a
//! resource directory, keeps the dynamic-attributes cache fresh, and serves
//! it over HTTP to clients and to the other nodes of the cluster.
//!
//! Usage:
//!   keel-server --config keel.toml --port 8080

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use keel_dynattr::{CacheRuntime, DeclaredAttributeSource, DynamicAttributesManager, InvalidationBus};
use keel_metadata::{FsResources, MetadataLoader, ResourceResolver};
use keel_server::{
    AppState, LogControl, LogThreshold, ServerConfig, build_router, spawn_peer_forwarder, wait_for_shutdown,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "keel-server")]
#[command(about = "Keel dynamic-attributes cache node")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP API port, overrides the configuration file
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.http_port = port;
    }

    let threshold = if args.verbose {
        LogThreshold::Debug
    } else {
        config.log_level
    };
    let log = LogControl::install(threshold);

    info!("Keel server starting...");
    let resources: Arc<dyn ResourceResolver> = Arc::new(FsResources::new(&config.resource_root));
    let loader = MetadataLoader::new(
        Arc::clone(&resources),
        config
            .metadata_sources()
            .context("Invalid metadata configuration")?,
    );
    let introspector = Arc::new(DeclaredAttributeSource::new(
        resources,
        config.attribute_files.clone(),
    ));
    let manager = Arc::new(DynamicAttributesManager::new(loader, introspector));

    let bus = InvalidationBus::default();
    let runtime = CacheRuntime::start(manager, bus.clone(), config.cache_config())
        .await
        .context("Initial dynamic attributes load failed")?;

    let forwarder = if config.peers.is_empty() {
        None
    } else {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Some(spawn_peer_forwarder(
            runtime.node_id(),
            bus.subscribe(),
            config.peers.clone(),
            client,
        ))
    };

    let app = build_router(AppState {
        service: Arc::new(runtime.service().clone()),
        bus,
        log,
    });

    let listener = tokio::net::TcpListener::bind((config.bind_address.as_str(), config.http_port))
        .await
        .with_context(|| format!("Failed to bind HTTP port {}", config.http_port))?;
    info!("HTTP API listening on {}", listener.local_addr()?);

    println!("\n========================================");
    println!("  Keel Cache Node Running");
    println!("========================================");
    println!("  Node:      {}", runtime.node_id());
    println!("  HTTP Port: {}", config.http_port);
    println!("  Resources: {}", config.resource_root.display());
    println!("  Peers:     {}", config.peers.len());
    println!("========================================\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Some(forwarder) = forwarder {
        forwarder.abort();
    }
    runtime.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await;
}
