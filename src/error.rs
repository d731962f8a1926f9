use thiserror::Error;

/// Main error type for propeval
#[derive(Error, Debug)]
pub enum PropevalError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input file structure or field errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Credential lookup errors
    #[error("Secret error: {0}")]
    Secret(String),

    /// Generative text API errors
    #[error("Generation API error: {0}")]
    Generation(String),
}

/// Convenient Result type using PropevalError
pub type Result<T> = std::result::Result<T, PropevalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PropevalError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("[1,").unwrap_err();
        let err: PropevalError = json_err.into();
        assert!(matches!(err, PropevalError::Json(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PropevalError = io_err.into();
        assert!(matches!(err, PropevalError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}
