// src/error.rs
use thiserror::Error;

/// Errors surfaced by the repository layer. Store and transport failures are
/// never swallowed; "nothing matched" outcomes are reported through boolean
/// results instead of errors.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Query execution error: {0}")]
    QueryError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid record id: {0}")]
    InvalidId(String),
}
