use anyhow::Result;
use sea_orm::Database;
use crate::schemas::AppState;

/// Database used when neither `--database-url` nor `DATABASE_URL` is given.
/// `mode=rwc` lets SQLite create the file on first use.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://favcities.db?mode=rwc";

/// Address the HTTP server binds to by default.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Initialize application state for the given database
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    Ok(AppState { db })
}
