//! Repository errors and shared helpers

use std::str::FromStr;

use nc_core::error::NcError;
use nc_core::traits::Id;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Id },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A business rule re-checked inside the write failed
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored value could not be mapped back to the model
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: Id) -> Self {
        RepositoryError::NotFound { entity, id }
    }

    /// Unique-constraint violations surface as conflicts
    pub(crate) fn from_unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(message.into())
            }
            _ => RepositoryError::Database(err),
        }
    }
}

impl From<RepositoryError> for NcError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => NcError::not_found(entity, "id", id),
            RepositoryError::Database(e) => NcError::Database(e.to_string()),
            RepositoryError::Validation(msg) => NcError::invalid(msg),
            RepositoryError::Conflict(msg) => NcError::conflict(msg),
            RepositoryError::InvalidData(msg) => NcError::Internal(msg),
        }
    }
}

/// Parse a TEXT column into one of the core enums
pub(crate) fn parse_column<T>(value: &str) -> RepositoryResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| RepositoryError::InvalidData(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_core::types::TaskStatus;

    #[test]
    fn test_parse_column() {
        let status: TaskStatus = parse_column("Running").unwrap();
        assert_eq!(status, TaskStatus::Running);
        assert!(matches!(
            parse_column::<TaskStatus>("Paused"),
            Err(RepositoryError::InvalidData(_))
        ));
    }

    #[test]
    fn test_error_mapping() {
        let err: NcError = RepositoryError::not_found("Task", 4).into();
        assert_eq!(err.status_code(), 404);

        let err: NcError = RepositoryError::Conflict("already decided".into()).into();
        assert_eq!(err.status_code(), 409);

        let err: NcError = RepositoryError::Validation("Insufficient leave balance".into()).into();
        assert_eq!(err.status_code(), 422);
    }
}
