use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use van_tracker_backend::config::{StorageConfig, TrackerConfig};
use van_tracker_backend::domain::hash_password;
use van_tracker_backend::{initialize_csv_backend, initialize_remote_backend, serve};

#[derive(Parser)]
#[command(name = "van-tracker", version, about = "School van fee and notification tracker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the REST API
    Serve {
        /// Path to the YAML configuration file
        #[arg(long, default_value = "van-tracker.yaml")]
        config: PathBuf,
    },
    /// Print an Argon2 hash to paste into the `admins` section
    HashPassword { password: String },
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("van_tracker_backend=info,van_tracker=info,warn"));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::HashPassword { password } => {
            let phc = hash_password(&password).map_err(|e| anyhow::anyhow!("failed to hash password: {}", e))?;
            println!("{}", phc);
            Ok(())
        }
        Command::Serve { config } => {
            init_tracing();
            let config = TrackerConfig::load(&config)?;
            info!("Serving {} schools", config.schools.len());

            match &config.storage {
                StorageConfig::Csv => serve(initialize_csv_backend(&config).await?, &config.bind_address).await,
                StorageConfig::RemoteTree { .. } => {
                    serve(initialize_remote_backend(&config)?, &config.bind_address).await
                }
            }
        }
    }
}
