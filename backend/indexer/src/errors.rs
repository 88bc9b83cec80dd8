//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event parse error: {0}")]
    EventParse(String),

    /// An indexed amount that is not a decimal `i128`.
    #[error("Event {event_id} has malformed amount {raw:?}")]
    Amount { event_id: i64, raw: String },

    /// Folding a project's events produced an impossible ledger.
    #[error("Inconsistent history for project {project_id}: {reason}")]
    Inconsistent { project_id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, IndexerError>;
