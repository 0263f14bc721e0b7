//! Shopmate CLI - Database migrations and taxonomy seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! shopmate-cli migrate
//!
//! # Seed the category taxonomy (idempotent)
//! shopmate-cli seed taxonomy
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shopmate-cli")]
#[command(author, version, about = "Shopmate CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Seed the two-level category taxonomy (safe to re-run)
    Taxonomy,
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Taxonomy => commands::seed::taxonomy().await?,
        },
    }
    Ok(())
}
