#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database was created with bucket size {stored}ms, expected {expected}ms")]
    BucketSizeMismatch { stored: i64, expected: i64 },
    #[error("byte count {0} does not fit in a sqlite integer")]
    ByteCountOverflow(u64),
    #[error("database connection lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, DbError>;
