//! Marketplace CLI - Data directory maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Delete expired sessions and verification tokens
//! mp-cli cleanup all
//!
//! # List users
//! mp-cli users list
//!
//! # Mark a user's email as verified
//! mp-cli users verify --email user@example.com
//!
//! # Delete a user with their sessions and tokens
//! mp-cli users delete --email user@example.com
//! ```
//!
//! # Commands
//!
//! - `cleanup` - Remove expired sessions and verification tokens
//! - `users` - List, verify and delete users
//!
//! Every command works on the same data directory as the storefront
//! (`--data-dir` or `MARKETPLACE_DATA_DIR`, default `mockdb`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use marketplace_storefront::db::JsonStore;

mod commands;

use commands::cleanup::CleanupTarget;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "Marketplace CLI tools")]
struct Cli {
    /// Directory holding the JSON collections
    #[arg(long, global = true, env = "MARKETPLACE_DATA_DIR", default_value = "mockdb")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete expired sessions and verification tokens
    Cleanup {
        /// What to clean up
        #[arg(value_enum, default_value_t = CleanupTarget::All)]
        target: CleanupTarget,
    },
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List all users
    List,
    /// Mark a user's email as verified
    Verify {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
    /// Delete a user and everything issued to them
    Delete {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonStore::new(cli.data_dir);

    match cli.command {
        Commands::Cleanup { target } => {
            let report = commands::cleanup::run(&store, target).await?;
            tracing::info!(
                sessions = report.sessions,
                verification_tokens = report.verification_tokens,
                "Cleanup complete"
            );
        }
        Commands::Users { action } => match action {
            UsersAction::List => {
                let users = commands::users::list(&store).await?;
                commands::users::print_table(&users);
            }
            UsersAction::Verify { email } => {
                let user = commands::users::verify(&store, &email).await?;
                tracing::info!(user_id = %user.id, email = %user.email, "Email verified");
            }
            UsersAction::Delete { email } => {
                let report = commands::users::delete(&store, &email).await?;
                tracing::info!(
                    email = %email,
                    sessions = report.sessions,
                    verification_tokens = report.verification_tokens,
                    "User deleted"
                );
            }
        },
    }
    Ok(())
}
