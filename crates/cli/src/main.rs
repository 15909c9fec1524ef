//! Loyalty CLI - Database migrations and staff bootstrap.
//!
//! # Usage
//!
//! ```bash
//! # Run identity and session table migrations
//! loyalty-cli migrate
//!
//! # Create the first executive without the break-glass secret
//! LOYALTY_BOOTSTRAP_PASSWORD='...' loyalty-cli staff create -v executive -e exec@example.com -n "Exec Name"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `staff create` - Create an active manager, executive or cashier

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "loyalty-cli")]
#[command(author, version, about = "Loyalty platform CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (identity tables and session store)
    Migrate,
    /// Manage staff accounts
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
}

#[derive(Subcommand)]
enum StaffAction {
    /// Create a staff account; the password is read from `LOYALTY_BOOTSTRAP_PASSWORD`
    Create {
        /// Staff variant (`manager`, `executive`, `cashier`)
        #[arg(short, long, default_value = "executive")]
        variant: String,

        /// Email address, also the login username
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Optional phone number
        #[arg(short, long)]
        phone: Option<String>,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Staff { action } => match action {
            StaffAction::Create {
                variant,
                email,
                name,
                phone,
            } => {
                commands::staff::create(&variant, email, name, phone).await?;
            }
        },
    }
    Ok(())
}
