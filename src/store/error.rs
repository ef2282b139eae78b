use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by store operations.
///
/// `Connection` means the underlying database link is gone (or could not be
/// established); a session holding that link cannot be reused. `Query` covers
/// per-statement failures on an otherwise healthy connection.
pub enum StoreError {
    /// Connection-level failure.
    #[error("database connection failed: {message}")]
    Connection { message: String },

    /// Statement-level failure.
    #[error("query failed: {message}")]
    Query { message: String },
}

impl StoreError {
    /// Returns `true` if the error invalidates the connection it occurred on.
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Connection {
                message: err.to_string(),
            },
            _ => StoreError::Query {
                message: err.to_string(),
            },
        }
    }
}
