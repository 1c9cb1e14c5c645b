use thiserror::Error;

use crate::data_type::DataType;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the engine can report to a caller.
///
/// Errors are returned on the first failure; no operation produces a partial result.
#[derive(Debug, Error)]
pub enum Error {
    /// A frame could not be assembled from the given columns.
    #[error("cannot construct frame: {0}")]
    Construction(#[from] ConstructionError),

    /// A column name used by select, filter or sort does not exist.
    #[error("column {0:?} not found")]
    ColumnNotFound(String),

    /// A predicate literal or operation is not compatible with the column type.
    #[error("type error: {0}")]
    Type(String),

    /// A raw field failed to parse under the inferred or declared type.
    #[error("row {row}: cannot parse {raw:?} as {dtype}")]
    Parse {
        row: usize,
        dtype: DataType,
        raw: String,
    },

    /// An ingested row does not have as many fields as the header.
    #[error("row {row} has {found} fields, expected {expected}")]
    Schema {
        row: usize,
        found: usize,
        expected: usize,
    },

    /// An internal invariant was violated (mask or operand length mismatch).
    #[error("consistency error: {0}")]
    Consistency(String),

    /// A source had no header or no rows to build a frame from.
    #[error("empty source: {0}")]
    EmptySource(String),

    /// The JSON document has a shape that cannot be turned into rows.
    #[error("unsupported json: {0}")]
    UnsupportedJson(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Reasons a set of columns cannot form a [`Frame`](crate::Frame).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("at least one column is required")]
    NoColumns,

    #[error("column {column:?} has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column {0:?}")]
    DuplicateColumn(String),
}
