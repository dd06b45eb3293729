//! Error types for FAMS

use thiserror::Error;

/// Result type alias for FAMS operations
pub type Result<T> = std::result::Result<T, FamsError>;

/// Main error type for FAMS
#[derive(Error, Debug)]
pub enum FamsError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = FamsError::InvalidInput("Page must be greater than 0".to_string());
        assert_eq!(err.to_string(), "Invalid input: Page must be greater than 0");

        let err: FamsError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(err.to_string().starts_with("Serialization error: "));
    }
}
