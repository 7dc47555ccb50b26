use diesel::result::Error as DieselError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Custom error type for ingestion-related operations
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Source file is unreadable: {0}")]
    UnreadableSource(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DieselError> for IngestError {
    fn from(err: DieselError) -> Self {
        IngestError::DatabaseError(err.to_string())
    }
}
