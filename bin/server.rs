// Firestore Sync - HTTP Trigger Server
// Serves the cron/webhook endpoints that run a sync pass per request

use anyhow::{Context, Result};
use clap::Parser;
use firestore_sync::{server, Config, SyncExecutor};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sync-server")]
#[command(version)]
#[command(about = "HTTP trigger for Realtime Database to Firestore sync passes")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "firestore-sync.toml")]
    config: PathBuf,

    /// Override the bind address from the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    println!("🌐 Firestore Sync - HTTP Trigger");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    let executor = SyncExecutor::from_config(&config).context("Failed to build sync executor")?;
    println!("✓ Syncing {} variables", executor.variables().len());

    let app = server::router(Arc::new(executor), config.server.platform);

    let addr = args.bind.unwrap_or(config.server.bind);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    println!("\n🚀 Server running on http://{addr}");
    for endpoint in server::SYNC_ENDPOINTS {
        println!("   Sync:   {endpoint}");
    }
    println!("   Health: /api/health");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
