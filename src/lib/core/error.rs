use thiserror::Error;
use validator::ValidationErrors;

/// A `Todo` invariant was violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoDomainError {
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("Title cannot be longer than 255 characters")]
    TitleTooLong,
}

/// Faults that escape a handler. Expected business failures ("not found")
/// travel as [`crate::core::Outcome::Failure`] instead.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain validation error: {0}")]
    Domain(#[from] TodoDomainError),
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    /// Short classification recorded on spans and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Domain(_) => "DomainError",
            AppError::Validation(_) => "ValidationError",
            AppError::Storage(_) => "StorageError",
        }
    }
}
