//! CloudBeat operator CLI.
//!
//! Reads the same environment as the gateway (SUPABASE_URL, SUPABASE_KEY, ...).
//! Every command runs with the service credential.

use anyhow::Context;
use clap::{Parser, Subcommand};
use cloudbeat_cli::{
    bucket_status_label, http_client, init_tracing, truncate_string, FAVOURITE_COLUMN_DDL,
};
use cloudbeat_core::{Config, Credential};
use cloudbeat_db::create_repositories;
use cloudbeat_storage::create_blob_store;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "cloudbeat", about = "CloudBeat catalog operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one song row to check catalog connectivity
    CheckDb,
    /// Print the DDL that adds the favourite column
    MigrateFavourites,
    /// Create the storage bucket, or make an existing one public
    CreateBucket {
        /// Create the bucket private instead
        #[arg(long)]
        private: bool,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn load_config() -> anyhow::Result<(Config, reqwest::Client)> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let http = http_client(config.http_timeout_secs)?;
    Ok((config, http))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::MigrateFavourites => {
            println!("-- Run in the SQL editor of the data platform:");
            println!("{}", FAVOURITE_COLUMN_DDL);
        }
        Commands::CheckDb => {
            let (config, http) = load_config()?;
            let repos = create_repositories(&config, http)
                .context("Failed to configure catalog. Set SUPABASE_URL and SUPABASE_KEY")?;
            let rows = repos
                .songs
                .sample(1, &Credential::Service)
                .await
                .context("Catalog query failed")?;
            match rows.first() {
                Some(row) => {
                    tracing::info!(
                        song_id = %row.id,
                        title = %truncate_string(&row.title, 40),
                        "Catalog reachable"
                    );
                    print_json(row)?;
                }
                None => {
                    tracing::info!("Catalog reachable; songs table is empty");
                    print_json(&serde_json::json!([]))?;
                }
            }
        }
        Commands::CreateBucket { private } => {
            let (config, http) = load_config()?;
            let blobs = create_blob_store(&config, http)
                .await
                .context("Failed to configure blob store")?;
            let status = blobs
                .store
                .ensure_bucket(!private)
                .await
                .with_context(|| format!("Failed to ensure bucket {}", config.storage_bucket))?;
            print_json(&serde_json::json!({
                "bucket": config.storage_bucket,
                "public": !private,
                "status": bucket_status_label(status),
            }))?;
        }
    }

    Ok(())
}
