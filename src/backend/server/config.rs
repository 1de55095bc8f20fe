/**
 * Storage Configuration
 *
 * Picks the storage backend from `AppConfig::database_url`.
 *
 * # Error Handling
 *
 * A database that cannot be opened is logged and the server continues on
 * the in-memory backend, so a broken `DATABASE_URL` never prevents startup.
 */

use crate::backend::storage::{SqliteStorage, Stores};
use crate::shared::AppConfig;

/// Open the configured storage backend
///
/// - `database_url` unset: in-memory storage
/// - `database_url` set: SQLite at that URL, migrations applied
/// - connection or migration failure: in-memory storage, with an error logged
pub async fn load_stores(config: &AppConfig) -> Stores {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set. Using in-memory storage; nothing will survive a restart.");
        return Stores::memory();
    };

    tracing::info!("Connecting to database...");
    match SqliteStorage::connect(database_url).await {
        Ok(storage) => {
            tracing::info!("Database connection established");
            Stores::sqlite(storage)
        }
        Err(e) => {
            tracing::error!("Failed to open database: {:?}", e);
            tracing::warn!("Falling back to in-memory storage.");
            Stores::memory()
        }
    }
}
