//! Error types for the data writer

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Construction errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    // Schema errors
    #[error("Column {0} cannot be null")]
    NullConstraintViolation(String),

    #[error("Value for column {column} exceeds {max} characters")]
    ValueTooLong { column: String, max: usize },

    // State errors
    #[error("Cannot {operation} while the writer is {state}")]
    InvalidState { operation: String, state: String },

    // Collaborator faults
    #[error("Connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Query(#[from] quarry_query::Error),

    #[error(transparent)]
    Value(#[from] quarry_value::Error),
}
