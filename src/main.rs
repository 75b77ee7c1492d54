use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "garmen")]
#[command(version, about = "Production tracking and payroll for a garment workshop")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Working directory (defaults to the current directory)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to serve on (overrides garmen.toml)
        #[arg(short, long)]
        port: Option<u16>,

        /// Database path (overrides garmen.toml)
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Auto-open the dashboard URL after the server starts
        #[arg(long, default_value = "true")]
        open: bool,

        /// Enable dev mode (bind all interfaces, permissive CORS)
        #[arg(long)]
        dev: bool,
    },
    /// Create the database and run migrations, then exit
    Init {
        /// Database path (overrides garmen.toml)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let default_level = if cli.verbose { "garmen=debug" } else { "garmen=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .init();

    let dir = match cli.dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Serve { port, db_path, open, dev } => {
            cmd::cmd_serve(&dir, *port, db_path.clone(), *open, *dev).await?;
        }
        Commands::Init { db_path } => {
            cmd::cmd_init(&dir, db_path.clone())?;
        }
    }

    Ok(())
}
