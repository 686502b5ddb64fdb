use clap::Parser;
use tracing_subscriber::EnvFilter;

use product_review_api::cli::Cli;
use product_review_api::config::{AppConfig, Environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and friends are picked up
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();
    init_tracing(config.environment);

    let cli = Cli::parse();
    if let Err(e) = product_review_api::cli::run(cli, config).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(environment: Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match environment {
        Environment::Development => tracing_subscriber::fmt().with_env_filter(filter).init(),
        Environment::Staging | Environment::Production => {
            tracing_subscriber::fmt().json().with_env_filter(filter).init()
        }
    }
}
