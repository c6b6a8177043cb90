use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{0}")]
    Other(String),
}
