use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeasonError {
    #[error("Unknown sport: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("Object store error: {0}")]
    Store(#[from] object_store::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

// Errors that abandon a sync cycle. The next cron firing starts over.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Malformed API response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid kickoff time {value:?}: {source}")]
    InvalidKickoff {
        value: String,
        source: chrono::ParseError,
    },
    #[error("Invalid watermark {value:?}: {source}")]
    InvalidWatermark {
        value: String,
        source: chrono::ParseError,
    },
}
