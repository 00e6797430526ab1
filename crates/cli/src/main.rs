//! Barangay CLI - run and administer the portal
//!
//! Usage:
//! ```bash
//! barangay serve
//! barangay --config barangay.toml init
//! barangay status
//! barangay add-staff --role secretary --username maria --email maria@brgy.ph --password secret
//! barangay sweep
//! ```

use anyhow::Result;
use barangay_config::ConfigLoader;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod db;

use commands::{serve, staff, sweep};

/// Barangay civic-services portal
#[derive(Parser)]
#[command(name = "barangay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// TOML config file; defaults are used when omitted
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server and the sanction sweeper until Ctrl-C
    Serve,

    /// Create the database and run migrations
    Init,

    /// Show row counts per table
    Status,

    /// Create a secretary or treasurer account
    AddStaff {
        #[arg(long)]
        role: StaffRoleArg,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Delete expired sanctions once
    Sweep,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StaffRoleArg {
    Secretary,
    Treasurer,
}

impl StaffRoleArg {
    pub fn to_core_role(&self) -> barangay_core::Role {
        match self {
            StaffRoleArg::Secretary => barangay_core::Role::Secretary,
            StaffRoleArg::Treasurer => barangay_core::Role::Treasurer,
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::load(cli.config.as_deref())?;

    init_tracing(&config.server.log_level);

    match cli.command {
        Commands::Serve => {
            serve::run(&config).await?;
        }

        Commands::Init => {
            db::init_database(&config).await?;
            println!("✅ Database initialized at {}", config.database.url);
        }

        Commands::Status => {
            db::show_status(&config).await?;
        }

        Commands::AddStaff {
            role,
            username,
            email,
            password,
        } => {
            staff::add_staff(&config, role.to_core_role(), &username, &email, &password).await?;
        }

        Commands::Sweep => {
            sweep::run(&config).await?;
        }
    }

    Ok(())
}
