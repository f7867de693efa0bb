use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid job context: {}", .0.join("; "))]
    InvalidJobContext(Vec<String>),

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Column '{column}' holds {actual} values, expected {expected}")]
    ColumnKind {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Column '{column}' has {actual} rows, table has {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(u64),

    #[error("Broken reference: {0}")]
    BrokenReference(String),

    #[error("Table {table} has ref_id {found}, job expects {expected}")]
    RefIdMismatch {
        table: String,
        expected: i64,
        found: i64,
    },

    #[error("Missing engine table: {0}")]
    MissingTable(String),

    #[error("Unsupported dbms: {0}")]
    UnsupportedDbms(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
