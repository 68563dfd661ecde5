//! Error handling for the typed sort utility

use std::io;
use thiserror::Error;

/// Custom error type for typed sort operations
#[derive(Error, Debug)]
pub enum SortError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("cannot open {path}: {reason}")]
    StreamUnavailable { path: String, reason: String },

    #[error("Invalid field separator: {sep:?}")]
    InvalidSeparator { sep: String },

    #[error("Unknown column type in specification: {spec}")]
    InvalidKindSpec { spec: String },

    #[error("Invalid column number in specification: {spec}")]
    InvalidColumnSpec { spec: String },

    #[error("line {line}, column {column} - invalid format")]
    InvalidCellFormat { line: usize, column: usize },

    #[error("line {line}, column {column} - value out of range")]
    CellOutOfRange { line: usize, column: usize },

    #[error("row length differs from the first row (first field length {first_field_len})")]
    RowShape { first_field_len: usize },

    #[error("Column out of range: {column}")]
    ColumnOutOfRange { column: usize },
}

impl SortError {
    /// Returns the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SortError::Io(_) | SortError::Utf8Error(_) => crate::EXIT_FAILURE,
            SortError::StreamUnavailable { .. } => crate::STREAM_FAILURE,
            SortError::InvalidSeparator { .. }
            | SortError::InvalidKindSpec { .. }
            | SortError::InvalidColumnSpec { .. } => crate::ARGUMENT_FAILURE,
            SortError::RowShape { .. } => crate::ROW_SHAPE_FAILURE,
            SortError::ColumnOutOfRange { .. } => crate::COLUMN_FAILURE,
            SortError::InvalidCellFormat { .. } => crate::FORMAT_FAILURE,
            SortError::CellOutOfRange { .. } => crate::RANGE_FAILURE,
        }
    }

    /// Create a stream unavailable error
    pub fn stream_unavailable(path: &str, reason: &str) -> Self {
        SortError::StreamUnavailable {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid separator error
    pub fn invalid_separator(sep: &str) -> Self {
        SortError::InvalidSeparator {
            sep: sep.to_string(),
        }
    }

    /// Create an unknown column type error
    pub fn invalid_kind_spec(spec: &str) -> Self {
        SortError::InvalidKindSpec {
            spec: spec.to_string(),
        }
    }

    /// Create an invalid column number error
    pub fn invalid_column_spec(spec: &str) -> Self {
        SortError::InvalidColumnSpec {
            spec: spec.to_string(),
        }
    }

    /// Create an invalid cell format error (1-based line and column)
    pub fn invalid_cell_format(line: usize, column: usize) -> Self {
        SortError::InvalidCellFormat { line, column }
    }

    /// Create a cell out of range error (1-based line and column)
    pub fn cell_out_of_range(line: usize, column: usize) -> Self {
        SortError::CellOutOfRange { line, column }
    }

    /// Create a row shape error
    pub fn row_shape(first_field_len: usize) -> Self {
        SortError::RowShape { first_field_len }
    }

    /// Create a column out of range error
    pub fn column_out_of_range(column: usize) -> Self {
        SortError::ColumnOutOfRange { column }
    }
}

/// Result type for typed sort operations
pub type SortResult<T> = Result<T, SortError>;

/// Context trait for adding context to errors
pub trait SortContext<T> {
    fn with_context<F>(self, f: F) -> SortResult<T>
    where
        F: FnOnce() -> String;

    fn with_file_context(self, filename: &str) -> SortResult<T>;
}

fn describe(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "No such file or directory".to_string(),
        io::ErrorKind::PermissionDenied => "Permission denied".to_string(),
        _ => err.to_string(),
    }
}

impl<T> SortContext<T> for Result<T, io::Error> {
    fn with_context<F>(self, f: F) -> SortResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|io_err| {
            SortError::Io(io::Error::new(
                io_err.kind(),
                format!("{}: {}", f(), io_err),
            ))
        })
    }

    fn with_file_context(self, filename: &str) -> SortResult<T> {
        self.map_err(|io_err| SortError::stream_unavailable(filename, &describe(&io_err)))
    }
}
