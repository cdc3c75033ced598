/// Error types for the WQM core library
use thiserror::Error;

/// Main error type for parsing published water-quality resources
#[derive(Error, Debug)]
pub enum WqmError {
    /// Failed to parse JSON payload
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Failed to read a local resource
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload had an unexpected shape
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Year token is not one of the published years
    #[error("Unsupported year: {0}")]
    UnsupportedYear(String),

    /// Graphic id pattern could not be compiled
    #[error("Invalid graphic id pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Type alias for Results using WqmError
pub type Result<T> = std::result::Result<T, WqmError>;
