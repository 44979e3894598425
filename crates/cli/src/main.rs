//! AK Fashion Hub CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! akf-cli migrate
//!
//! # Give an existing account access to /admin
//! akf-cli admin grant owner@akfashionhub.in
//!
//! # Copy the built-in demo catalog into the product tables
//! akf-cli seed demo
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "akf-cli")]
#[command(author, version, about = "AK Fashion Hub CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the admin role
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant the admin role to a registered user
    Grant {
        /// Email the user signed up with
        email: String,
    },
    /// Revoke the admin role
    Revoke {
        /// Email the user signed up with
        email: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert the demo catalog as real products
    Demo {
        /// Seed even if the product table already has rows
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Grant { email } => commands::admin::grant(&email).await?,
            AdminAction::Revoke { email } => commands::admin::revoke(&email).await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Demo { force } => commands::seed::demo(force).await?,
        },
    }
    Ok(())
}
