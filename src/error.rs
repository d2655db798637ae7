// Cardex Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardexError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid card ID: {0}")]
    InvalidCardId(String),

    #[error("Invalid language: {0}")]
    InvalidLanguage(String),

    #[error("Invalid variant: {0}")]
    InvalidVariant(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Backup error: {0}")]
    Backup(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for CardexError {
    fn from(err: reqwest::Error) -> Self {
        CardexError::Catalog(err.to_string())
    }
}

impl From<anyhow::Error> for CardexError {
    fn from(err: anyhow::Error) -> Self {
        CardexError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CardexError>;
