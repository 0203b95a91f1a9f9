use thiserror::Error;

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A CHECK constraint rejected the write, e.g. stock going negative.
    #[error("Check constraint violated: {constraint}")]
    CheckViolation { constraint: String },

    /// A UNIQUE constraint rejected the write, e.g. a second cart for a customer.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A write was failed on purpose by the in-memory store.
    #[error("Injected failure: {0}")]
    Injected(&'static str),

    /// A stored value could not be decoded into a record.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Classifies a sqlx error, lifting constraint violations out of the
    /// generic database variant.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.kind() {
                sqlx::error::ErrorKind::CheckViolation => {
                    return StoreError::CheckViolation { constraint };
                }
                sqlx::error::ErrorKind::UniqueViolation => {
                    return StoreError::UniqueViolation { constraint };
                }
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
