use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("Failed to connect to the database: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Failed to insert record #{position} ({name}): {source}")]
    InsertFailed {
        /// 1-based position of the record in the decoded sequence.
        position: usize,
        name: String,
        source: sqlx::Error,
    },

    #[error("Database query failed: {0}")]
    QueryError(#[source] sqlx::Error),

    #[error("'{0}' is not a valid table name.")]
    InvalidTableName(String),
}

impl DbError {
    /// Wraps an error raised while inserting one record, keeping transport
    /// failures distinct from failures of the statement itself.
    pub(crate) fn from_insert(position: usize, name: &str, source: sqlx::Error) -> Self {
        if is_connection_failure(&source) {
            DbError::ConnectionError(source)
        } else {
            DbError::InsertFailed {
                position,
                name: name.to_string(),
                source,
            }
        }
    }
}

/// True for errors that mean the database could not be reached at all.
pub fn is_connection_failure(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}
