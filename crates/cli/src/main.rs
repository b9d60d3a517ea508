//! Prestige Motor Works CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! pmw-cli migrate
//!
//! # Create an admin user
//! pmw-cli admin create -e admin@example.com -p <password> \
//!     --first-name Ada --last-name Lovelace
//!
//! # Seed the vehicle catalog from a YAML file
//! pmw-cli seed vehicles -f catalog.yaml --clear
//! ```
//!
//! # Commands
//!
//! - `migrate` - Apply pending database migrations
//! - `admin create` - Create an admin account
//! - `seed vehicles` - Load the catalog (vehicles, discounts, customizations)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pmw-cli")]
#[command(author, version, about = "Prestige Motor Works CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed database tables
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an admin account
    Create {
        /// Email address for the account
        #[arg(short, long)]
        email: String,

        /// Admin password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Admin first name
        #[arg(long, default_value = "Admin")]
        first_name: String,

        /// Admin last name
        #[arg(long, default_value = "User")]
        last_name: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Seed the vehicle catalog from a YAML file
    Vehicles {
        /// Path to the catalog YAML file
        #[arg(short, long)]
        file: String,

        /// Clear existing catalog rows before seeding
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                password,
                first_name,
                last_name,
            } => {
                commands::admin::create_user(&email, &password, &first_name, &last_name).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Vehicles { file, clear } => {
                commands::seed::vehicles(&file, clear).await?;
            }
        },
    }
    Ok(())
}
