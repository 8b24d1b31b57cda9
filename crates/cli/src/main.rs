//! Tierstore CLI - Database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run checkout database migrations
//! tierstore-cli migrate
//!
//! # Load users, products and campaigns from YAML
//! tierstore-cli seed fixtures/catalog.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Upsert seed data from a YAML file

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tierstore-cli")]
#[command(author, version, about = "Tierstore CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run checkout database migrations
    Migrate,
    /// Upsert users, products and campaigns from a YAML file
    Seed {
        /// Path to the seed file
        file: String,

        /// Validate the file without touching the database
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::checkout().await?,
        Commands::Seed { file, dry_run } => commands::seed::catalog(&file, dry_run).await?,
    }
    Ok(())
}
