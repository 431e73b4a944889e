use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nostr_gateway::api::{self, AppState};
use nostr_gateway::config::AppConfig;
use nostr_gateway::crypto::SchnorrSigner;
use nostr_gateway::database::EventStore;
use nostr_gateway::nostr::{EventBroadcaster, EventBuilder, PoolRelayClient, RelayStatusTracker};

#[derive(Parser)]
#[command(name = "nostr-gateway")]
#[command(about = "HTTP gateway that signs notes and broadcasts them to Nostr relays")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./gateway.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nostr_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    info!("Configuration loaded");

    let signer = Arc::new(SchnorrSigner::new());
    let identity = config.signing_identity(signer.as_ref())?;
    info!("Signing as {}", identity.public_key());

    let store = EventStore::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    store.run_migrations().await?;
    info!("Database ready");

    let relays = config.relay_urls();
    let tracker = RelayStatusTracker::new(relays);
    let client = Arc::new(PoolRelayClient::new(config.publish_timeout()));

    if !config.is_production() {
        info!("Checking relay connections...");
        tracker.probe_all(client.as_ref()).await;
        for relay in tracker.list() {
            match (relay.connected, relay.error.as_deref()) {
                (true, _) => info!("- {}: Connected", relay.url),
                (false, Some(error)) => info!("- {}: Disconnected ({})", relay.url, error),
                (false, None) => info!("- {}: Disconnected", relay.url),
            }
        }
    }

    let builder = EventBuilder::new(identity, signer);
    let broadcaster = EventBroadcaster::new(builder, client, tracker, store.clone())
        .with_publish_timeout(config.publish_timeout());

    let app = api::router(AppState {
        broadcaster: broadcaster.clone(),
        store,
        production: config.is_production(),
    });

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server_host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    broadcaster.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
