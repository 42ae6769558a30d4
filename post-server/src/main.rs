use anyhow::{Context, Result};
use tracing::{info, warn};

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use data::repositories::memory::post_repository::InMemoryPostStorage;
use data::repositories::mongo::post_repository::MongoPostStorage;
use infrastructure::logging::init_logging;
use infrastructure::settings::{Settings, StorageSettings};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level, settings.log_format)?;

    match &settings.storage {
        StorageSettings::MongoDb { uri, database } => {
            let storage = MongoPostStorage::from_uri(uri, database)
                .await
                .context("failed to parse MongoDB connection settings")?;
            storage
                .ensure_indexes()
                .await
                .context("failed to ensure post indexes")?;
            info!(database = %database, "using mongodb storage");

            server::run(&settings, storage).await
        }
        StorageSettings::Memory => {
            warn!("using in-memory storage, posts are lost on restart");
            server::run(&settings, InMemoryPostStorage::new()).await
        }
    }
}
