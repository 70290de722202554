use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the transaction table.
///
/// Every variant is fatal for the process run: the dashboard has nothing to
/// show without its table, so callers propagate these straight to `main`.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The source file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be decoded (bad quoting, missing column, a price or
    /// identifier that is not a number).
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// One of the two timestamp columns did not match any recognised format.
    #[error("Invalid {column} on line {line}: {value:?}")]
    TimestampParse {
        line: u64,
        column: &'static str,
        value: String,
    },

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the sales crates.
pub type Result<T> = std::result::Result<T, LoadError>;
