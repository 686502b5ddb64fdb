use std::sync::Arc;

use anyhow::Context;
use mockable::DefaultClock;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::{CatalogRepository, DatabaseManager, MemoryStore, PgStore, UserRepository};
use crate::services::seed_demo_data;
use crate::state::AppState;

pub async fn handle(mut config: AppConfig, port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.api.port = port;
    }
    info!("Starting Product Review API in {:?} mode", config.environment);

    let (users, catalog): (Arc<dyn UserRepository>, Arc<dyn CatalogRepository>) = if memory {
        warn!("Using the in-memory store; all data is lost on exit");
        let store = Arc::new(MemoryStore::new());
        (store.clone(), store)
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to the database (use --memory to run without one)")?;
        if config.database.run_migrations {
            DatabaseManager::migrate(&pool).await.context("failed to apply migrations")?;
        }
        let store = Arc::new(PgStore::new(pool));
        (store.clone(), store)
    };

    let seed = config.seed.demo_data;
    let port = config.api.port;
    let state = AppState::new(config, users, catalog, Arc::new(DefaultClock))?;

    if seed {
        seed_demo_data(&state).await.context("failed to seed demo data")?;
    }

    crate::server::serve(state, port).await?;
    Ok(())
}
