use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{debug, error};

/// Error types for the store layer.
///
/// Missing rows are never errors here; lookups return `Option` and the
/// service layer decides what absence means.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(DbErr),

    /// A unique index rejected the write
    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    /// The write referenced a row that does not exist
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                debug!(%message, "Unique constraint violation");
                StoreError::Duplicate(message)
            }
            Some(SqlErr::ForeignKeyConstraintViolation(message)) => {
                debug!(%message, "Foreign key constraint violation");
                StoreError::InvalidReference(message)
            }
            _ => {
                // Some drivers only surface the constraint in the message text
                let message = err.to_string();
                if message.to_lowercase().contains("unique constraint") {
                    debug!(%message, "Unique constraint violation");
                    StoreError::Duplicate(message)
                } else {
                    error!(?err, "Database error");
                    StoreError::Database(err)
                }
            }
        }
    }
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }
}

/// Type alias for Result with StoreError
pub type Result<T> = std::result::Result<T, StoreError>;
