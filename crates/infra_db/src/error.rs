//! Database error types
//!
//! SQLx errors are classified by PostgreSQL error code on the way in and
//! translated to [`PortError`] on the way out, so the ledger domain never
//! sees a driver type.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation, e.g. negative stock reaching the table
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Serialization failure or deadlock; the transaction may be retried
    #[error("Transaction aborted: {0}")]
    TransactionAborted(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be decoded into its domain type
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Unclassified SQL error
    #[error("SQL error: {0}")]
    SqlError(sqlx::Error),
}

impl DatabaseError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if a retry could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_)
                | DatabaseError::PoolExhausted
                | DatabaseError::TransactionAborted(_)
        )
    }
}

/// Maps SQLx errors to specific variants by PostgreSQL error code
///
/// See <https://www.postgresql.org/docs/current/errcodes-appendix.html>.
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &error {
            let code = db_err.code().map(|code| code.into_owned());
            let message = db_err.message().to_string();
            return match code.as_deref() {
                Some("23505") => DatabaseError::DuplicateEntry(message),
                Some("23503") => DatabaseError::ForeignKeyViolation(message),
                Some("23514") => DatabaseError::ConstraintViolation(message),
                Some("40001") | Some("40P01") => DatabaseError::TransactionAborted(message),
                _ => DatabaseError::QueryFailed(message),
            };
        }

        match error {
            sqlx::Error::RowNotFound => DatabaseError::not_found("Record", "unknown"),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::SerializationError(error.to_string())
            }
            other => DatabaseError::SqlError(other),
        }
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound { entity, id } => PortError::NotFound {
                entity_type: entity,
                id,
            },
            DatabaseError::DuplicateEntry(message) => PortError::Conflict { message },
            DatabaseError::ForeignKeyViolation(message)
            | DatabaseError::ConstraintViolation(message)
            | DatabaseError::SerializationError(message) => PortError::Validation { message },
            transient if transient.is_transient() => PortError::Connection {
                message: transient.to_string(),
                source: Some(Box::new(transient)),
            },
            other => PortError::Internal {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}
