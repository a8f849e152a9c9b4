//! Errors
//!
//! Custom error types used throughout the `decision_graph` crate.
use thiserror::Error;

/// Errors that can occur while building tables, configuring or using a decision graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A column name that is not part of the table.
    #[error("Column {0} was not found in the table.")]
    UnknownColumn(String),
    /// The label column must be categorical.
    #[error("Label column {0} must be categorical.")]
    LabelNotCategorical(String),
    /// The label column needs at least one legal value.
    #[error("Label column {0} has an empty domain.")]
    EmptyLabelDomain(String),
    /// Number of columns does not match the number of column specs.
    #[error("Table has {0} column specs but {1} columns were provided.")]
    ColumnCount(usize, usize),
    /// First value is the column, second is the number of values found, third the expected number.
    #[error("Column {0} has {1} values, expected {2}.")]
    ColumnLength(String, usize, usize),
    /// First value is the column, second the expected type, third the type provided.
    #[error("Column {0} expects {1} values, but {2} values were provided.")]
    TypeMismatch(String, String, String),
    /// A categorical value outside of the column's closed domain.
    #[error("Value {0} is not in the domain of column {1}.")]
    UnknownCategory(String, String),
    /// NaN values cannot be ordered for threshold search.
    #[error("Column {0} contains a NaN value.")]
    NanValue(String),
    /// A row with the wrong number of cells.
    #[error("Row has {0} cells, expected {1}.")]
    RowLength(usize, usize),
    /// Prediction data must share the schema the graph was trained on.
    #[error("Dataset schema does not match the schema the graph was trained on.")]
    SchemaMismatch,
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Unable to write config to file.
    #[error("Unable to write config to file: {0}")]
    UnableToWrite(String),
    /// Unable to read config from file.
    #[error("Unable to read config from a file {0}")]
    UnableToRead(String),
}
