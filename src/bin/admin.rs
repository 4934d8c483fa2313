//! Operator CLI for linkstore.
//!
//! Talks to the configured storage backend directly, without going through
//! the HTTP service. Writes are ownership-checked exactly as they are over
//! HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Point a short alias at a URL on behalf of user 7
//! cargo run --bin admin -- short put miserable pigeon.example --owner 7
//!
//! # Resolve it
//! cargo run --bin admin -- short get miserable
//!
//! # List aliases in a key range
//! cargo run --bin admin -- short list --start a --end m
//!
//! # Delete it (asks for confirmation)
//! cargo run --bin admin -- short rm miserable --owner 7
//!
//! # Create or fetch a user
//! cargo run --bin admin -- user login pigeon@example.com --name Pigeon
//!
//! # Run the backend health check
//! cargo run --bin admin -- health
//! ```
//!
//! # Environment Variables
//!
//! Same storage variables as the server: `STORAGE_BACKEND`, `LMDB_PATH`,
//! `CQL_HOSTS`, `CQL_KEYSPACE`, `DATABASE_URL` and friends.

use linkstore::application::services::{ShortService, UserService};
use linkstore::config::StorageConfig;
use linkstore::domain::entities::ShortRecord;
use linkstore::domain::repositories::Backend;
use linkstore::health::HealthRegistry;
use linkstore::infrastructure::persistence;
use linkstore::telemetry;
use linkstore::utils::validation::normalize_long;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use std::sync::Arc;
use std::time::Duration;

/// CLI tool for managing linkstore data.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage short aliases
    Short {
        #[command(subcommand)]
        action: ShortAction,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Check the storage backend
    Health,
}

/// Short alias subcommands.
#[derive(Subcommand)]
enum ShortAction {
    /// Resolve an alias to its long URL
    Get { short: String },

    /// Create or update an alias
    Put {
        short: String,

        /// Target URL; `http://` is added when no scheme is given
        long: String,

        /// Owning user id
        #[arg(short, long)]
        owner: u64,
    },

    /// Delete an alias
    Rm {
        short: String,

        /// Owning user id
        #[arg(short, long)]
        owner: u64,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List aliases in `[start, end]`; an empty bound is open
    List {
        #[arg(short, long, default_value = "")]
        start: String,

        #[arg(short, long, default_value = "")]
        end: String,
    },
}

/// User subcommands.
#[derive(Subcommand)]
enum UserAction {
    /// Fetch the user for an email, creating it if needed
    Login {
        email: String,

        /// Display name, used only on creation
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show a user by id
    Get { id: u64 },

    /// Delete a user by id
    Rm {
        id: u64,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    telemetry::init("warn", "text")?;

    let storage = StorageConfig::from_env()?;
    storage.validate()?;

    let health = HealthRegistry::default();
    let backend = persistence::open(&storage, &health)
        .await
        .with_context(|| format!("Failed to open {}", storage.describe()))?;

    match cli.command {
        Commands::Short { action } => handle_short_action(action, backend).await?,
        Commands::User { action } => handle_user_action(action, backend).await?,
        Commands::Health => handle_health(&health, &storage).await?,
    }

    Ok(())
}

/// Dispatches short alias commands. The CLI is short-lived, so no cache.
async fn handle_short_action(action: ShortAction, backend: Arc<dyn Backend>) -> Result<()> {
    let service = ShortService::new(backend, None, Duration::ZERO);

    match action {
        ShortAction::Get { short } => {
            let long = service.read_short(&short).await?;
            println!("  {} -> {}", short.cyan(), long.bright_white());
        }
        ShortAction::Put { short, long, owner } => {
            let long = normalize_long(&long)?;
            let record = service
                .write_short(ShortRecord::new(short, long, owner))
                .await
                .map_err(|e| anyhow::anyhow!("Failed to store alias: {}", e))?;

            println!("{}", "Alias stored".green().bold());
            print_short(&record);
        }
        ShortAction::Rm { short, owner, yes } => {
            if !yes && !confirm(&format!("Delete alias '{short}'?"))? {
                println!("{}", "Cancelled".red());
                return Ok(());
            }

            service
                .delete_short(&short, owner)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to delete alias: {}", e))?;

            println!("{}", "Alias deleted".green().bold());
        }
        ShortAction::List { start, end } => list_shorts(&service, &start, &end).await?,
    }

    Ok(())
}

/// Lists aliases in key order.
///
/// # Output Format
///
/// ```text
///   Short                Owner                  Long
///   ------------------------------------------------------------------
///   miserable            7                      http://pigeon.example
/// ```
async fn list_shorts(service: &ShortService<dyn Backend>, start: &str, end: &str) -> Result<()> {
    let records = service.list_shorts(start, end).await?;

    if records.is_empty() {
        println!("{}", "  No aliases found".yellow());
        return Ok(());
    }

    println!(
        "  {:<20} {:<22} {}",
        "Short".bright_white().bold(),
        "Owner".bright_white().bold(),
        "Long".bright_white().bold()
    );
    println!("  {}", "-".repeat(66).bright_black());

    for record in &records {
        println!(
            "  {:<20} {:<22} {}",
            record.short.cyan(),
            record.owner.to_string().bright_black(),
            record.long
        );
    }

    println!();
    println!(
        "  Total: {}",
        records.len().to_string().bright_white().bold()
    );

    Ok(())
}

/// Dispatches user commands.
async fn handle_user_action(action: UserAction, backend: Arc<dyn Backend>) -> Result<()> {
    let service = UserService::new(backend);

    match action {
        UserAction::Login { email, name } => {
            let name = match name {
                Some(n) => n,
                None => Input::new()
                    .with_prompt("Name")
                    .allow_empty(true)
                    .interact_text()?,
            };

            let user = service.login(&email, &name).await?;

            println!("  Id:    {}", user.id.to_string().bright_yellow().bold());
            println!("  Email: {}", user.email.cyan());
            println!("  Name:  {}", user.name);
        }
        UserAction::Get { id } => {
            let user = service.user(id).await?;

            println!("  Id:    {}", user.id.to_string().bright_yellow());
            println!("  Email: {}", user.email.cyan());
            println!("  Name:  {}", user.name);
        }
        UserAction::Rm { id, yes } => {
            if !yes && !confirm(&format!("Delete user {id}?"))? {
                println!("{}", "Cancelled".red());
                return Ok(());
            }

            service.delete_user(id).await?;
            println!("{}", "User deleted".green().bold());
        }
    }

    Ok(())
}

/// Runs the registered backend check.
async fn handle_health(health: &HealthRegistry, storage: &StorageConfig) -> Result<()> {
    println!(
        "{}",
        format!("Checking {}...", storage.describe()).bright_blue()
    );

    health
        .check_all()
        .await
        .map_err(|e| anyhow::anyhow!("Health check failed: {}", e))?;

    println!("{}", "Storage OK".green().bold());
    Ok(())
}

fn print_short(record: &ShortRecord) {
    println!("  Short: {}", record.short.cyan());
    println!("  Long:  {}", record.long.bright_white());
    println!("  Owner: {}", record.owner.to_string().bright_black());
}

fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
