//! Endpoint-Mapping Gateway (v1)
//!
//! A gateway add-on that routes inbound HTTP requests to backend service
//! instances whose endpoints are discovered dynamically rather than
//! declared as static routes.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │              ENDPOINT GATEWAY                  │
//!                         │                                                │
//!   Client Request        │  ┌─────────┐   ┌──────────────┐               │
//!   ──────────────────────┼─▶│  http   │──▶│   routing    │               │
//!                         │  │ server  │   │ matcher      │               │
//!                         │  └─────────┘   └──────┬───────┘               │
//!                         │                       │ reads snapshot        │
//!                         │                ┌──────▼───────┐               │
//!                         │                │   mapping    │               │
//!                         │                │   registry   │◀── refresh    │
//!                         │                └──────┬───────┘    controller │
//!                         │                       │                       │
//!                         │                ┌──────▼───────┐               │
//!   Client Response       │                │   forward    │──▶ Backend    │
//!   ◀─────────────────────┼────────────────│  (chooser)   │    Instance   │
//!                         │                └──────────────┘               │
//!                         │                                                │
//!                         │  config (TOML + watcher)   discovery (trait)  │
//!                         └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use endpoint_gateway::config::{load_config, ConfigWatcher, GatewayConfig, SharedConfig};
use endpoint_gateway::discovery::StaticServiceDirectory;
use endpoint_gateway::forward::RoundRobin;
use endpoint_gateway::http::GatewayServer;
use endpoint_gateway::refresh::{RefreshController, RefreshTrigger};
use endpoint_gateway::routing::MappingRegistry;

#[derive(Debug, Parser)]
#[command(name = "endpoint-gateway", about = "Endpoint-mapping gateway router")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "endpoint_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("endpoint-gateway v0.1.0 starting");

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        services = config.services.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            endpoint_gateway::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let directory = Arc::new(StaticServiceDirectory::from_config(&config.services));
    let shared = SharedConfig::new(config);
    let registry = Arc::new(MappingRegistry::new());
    let controller = Arc::new(RefreshController::new(
        registry.clone(),
        Arc::new(shared.clone()),
        directory.clone(),
    ));

    // Initial rebuild, then follow triggers from the config watcher.
    controller.handle(RefreshTrigger::Startup);

    let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
    let _watcher = match &args.config {
        Some(path) => {
            let watcher = ConfigWatcher::new(path, shared.clone(), trigger_tx);
            Some(watcher.run()?)
        }
        None => None,
    };
    tokio::spawn(controller.clone().run(trigger_rx));

    let bind_address = shared.load().listener.bind_address.clone();
    let listener = TcpListener::bind(&bind_address).await?;

    let server = GatewayServer::new(
        shared,
        registry,
        directory,
        Arc::new(RoundRobin::new()),
    );
    server.run(listener).await?;

    controller.shutdown();
    tracing::info!("Shutdown complete");
    Ok(())
}
