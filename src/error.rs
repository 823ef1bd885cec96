//! Error types shared by the engine, the store and the front end.

use thiserror::Error;

/// Reasons a [`Settings`](crate::models::Settings) value cannot start a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("at least one operation must be enabled")]
    NoOperators,

    #[error("there are no wrongly answered questions to practice")]
    EmptyWrongAnswerPool,

    #[error("question count must be between 1 and {max}, got {count}")]
    QuestionCountOutOfRange { count: u32, max: u32 },

    #[error("time limit must be between 1 and 60 minutes, got {0}")]
    TimeLimitOutOfRange(u32),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("stored timestamp '{0}' is not valid RFC 3339")]
    Timestamp(String),
}

pub type Result<T> = std::result::Result<T, Error>;
