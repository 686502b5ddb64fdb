pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "product-review-api")]
#[command(about = "Product catalog and review API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides API_PORT)")]
        port: Option<u16>,

        #[arg(long, help = "Use the in-memory store instead of Postgres")]
        memory: bool,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

pub async fn run(cli: Cli, config: crate::config::AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, memory } => commands::serve::handle(config, port, memory).await,
        Commands::Migrate => commands::migrate::handle(config).await,
    }
}
