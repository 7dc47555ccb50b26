use diesel::result::Error as DieselError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PerformanceError>;

/// Custom error type for performance-related operations
#[derive(Debug, Error)]
pub enum PerformanceError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DieselError> for PerformanceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => PerformanceError::NotFound("Record not found".to_string()),
            other => PerformanceError::DatabaseError(other.to_string()),
        }
    }
}
