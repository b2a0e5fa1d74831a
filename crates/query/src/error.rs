//! Error types for the query algebra and SQL formatting

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Construction errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "{function} takes {min}..{} arguments, got {found}",
        max.map_or_else(String::new, |m| m.to_string())
    )]
    ArgumentCount {
        function: String,
        min: usize,
        max: Option<usize>,
        found: usize,
    },

    #[error("Column name cannot be empty")]
    EmptyColumnName,

    #[error("Column already exists: {0}")]
    DuplicateColumn(String),

    // Evaluation errors
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error(transparent)]
    Value(#[from] quarry_value::Error),

    // Dialect errors
    #[error("{feature} is not supported by the {dialect} dialect")]
    UnsupportedByDialect { dialect: String, feature: String },

    // Transport errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}
