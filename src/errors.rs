/*!
 * Error types for the lingotag library.
 *
 * Storage-level failures are described by `StoreError`; the service boundary
 * converts those into the typed `ServiceError` kinds callers match on.
 * Both are defined with the thiserror crate.
 */

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors raised by the database layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// A row addressed by id does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity (table) name
        entity: &'static str,
        /// Requested identifier
        id: i64,
    },

    /// A UNIQUE or PRIMARY KEY constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Any other SQLite error
    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    /// The connection mutex was poisoned
    #[error("Failed to acquire database lock: {0}")]
    Lock(String),

    /// A blocking database task panicked or was cancelled
    #[error("Database task failed: {0}")]
    TaskJoin(String),
}

impl StoreError {
    /// Whether this error is a uniqueness violation
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ffi_error, ref message) = error {
            if ffi_error.code == ErrorCode::ConstraintViolation
                && (ffi_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || ffi_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
            {
                let detail = message
                    .clone()
                    .unwrap_or_else(|| ffi_error.to_string());
                return StoreError::UniqueViolation(detail);
            }
        }
        StoreError::Sqlite(error)
    }
}

/// Result alias for database operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the translation service
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The referenced translation does not exist
    #[error("Translation not found: {id}")]
    NotFound {
        /// Requested translation id
        id: i64,
    },

    /// A translation with this key and locale already exists
    #[error("Translation already exists for key '{key}' and locale '{locale}'")]
    Duplicate {
        /// Translation key
        key: String,
        /// Translation locale
        locale: String,
    },

    /// Client input rejected before touching storage
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unexpected storage failure
    #[error("Storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl ServiceError {
    /// Conventional HTTP status for adapters that expose the service over HTTP
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::NotFound { .. } => 404,
            ServiceError::Duplicate { .. } => 409,
            ServiceError::Validation(_) => 422,
            ServiceError::Storage(_) => 500,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id, .. } => ServiceError::NotFound { id },
            other => ServiceError::Storage(other),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(error: rusqlite::Error) -> Self {
        StoreError::from(error).into()
    }
}

/// Result alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
