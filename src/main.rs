use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use firestore_sync::{Config, PassStatus, SyncExecutor};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "firestore-sync")]
#[command(version)]
#[command(about = "Copy Realtime Database readings into Firestore collections")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "firestore-sync.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync pass and print the report as JSON
    Run,

    /// Validate configuration file
    Validate,

    /// Show example configuration
    Example,
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Example => {
            println!("{}", Config::example_toml());
        }

        Commands::Validate => {
            let config = load_config(&cli.config)?;
            config.validate().context("Invalid configuration")?;

            println!("✓ Configuration valid: {:?}", cli.config);
            println!("  Source:      {}", config.source.database_url);
            println!("  Project:     {}", config.destination.project_id);
            println!("  Variables:   {}", config.variables.join(", "));
            println!("  Platform:    {}", config.server.platform.as_str());
            match config.resolve_api_key() {
                Ok(_) => println!("  API key:     resolved"),
                Err(e) => println!("  API key:     ⚠️  {e}"),
            }
        }

        Commands::Run => {
            let config = load_config(&cli.config)?;
            let executor =
                SyncExecutor::from_config(&config).context("Failed to build sync executor")?;

            let report = executor.run_sync_pass().await;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if report.status == PassStatus::FetchFailed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    Config::from_file(path).with_context(|| format!("Failed to load config from {path:?}"))
}
