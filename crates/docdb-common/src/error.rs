//! Error definitions for docdb

use thiserror::Error;

/// Represents errors that can occur while building or dispatching docdb operations.
///
/// # Example
/// ```rust
/// use docdb_common::DbError;
///
/// fn example() -> docdb_common::Result<()> {
///     Err(DbError::Shape("nested sequences are not documents".into()))
/// }
///
/// match example() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error occurred: {e}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Input did not match any accepted document or command shape.
    #[error("Shape error: {0}")]
    Shape(String),

    /// The requested combination cannot be expressed by the negotiated protocol.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The server answered a command with a failure where a value was required.
    #[error("Command failed ({code}): {message}")]
    Command { code: i64, message: String },

    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Get the inner message without the type prefix.
    /// Useful when re-wrapping errors to avoid "Shape error: Shape error: ..."
    pub fn message(&self) -> &str {
        match self {
            DbError::Io(msg) => msg,
            DbError::Parse(msg) => msg,
            DbError::Shape(msg) => msg,
            DbError::Unsupported(msg) => msg,
            DbError::Network(msg) => msg,
            DbError::Command { message, .. } => message,
            DbError::TypeError { expected, .. } => expected,
            DbError::Config(msg) => msg,
        }
    }

    /// Get a short error kind name
    pub fn kind(&self) -> &'static str {
        match self {
            DbError::Io(_) => "io_error",
            DbError::Parse(_) => "parse_error",
            DbError::Shape(_) => "shape_error",
            DbError::Unsupported(_) => "unsupported",
            DbError::Network(_) => "network_error",
            DbError::Command { .. } => "command_error",
            DbError::TypeError { .. } => "type_error",
            DbError::Config(_) => "config_error",
        }
    }
}

/// Convert std::io::Error to DbError
impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        DbError::Io(err.to_string())
    }
}
