use thiserror::Error;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),
    #[error("Content source error: {0}")]
    Source(String),
    #[error("Embedding error: {0}")]
    Embedding(String),
    #[error("Answer generation error: {0}")]
    Answer(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
}
