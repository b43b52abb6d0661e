//! Error types for the data-loader crate.

use thiserror::Error;

/// Errors that can occur while loading the ratings and movies tables
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The header row lacks a column the loader needs
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// Line in data file couldn't be parsed
    ///
    /// `line` is 1-based and counts the header row.
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
