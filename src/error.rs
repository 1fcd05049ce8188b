//! Error types for ratedesk

use thiserror::Error;

/// Main error type for ratedesk
#[derive(Error, Debug)]
pub enum RateDeskError {
    // Negotiation errors
    #[error("Invalid offer: {0}")]
    InvalidOffer(String),

    #[error("Load not found: {0}")]
    LoadNotFound(String),

    // Ledger errors
    #[error("Invalid call outcome: missing {0}")]
    InvalidOutcome(&'static str),

    // Carrier registry errors
    #[error("Carrier lookup failed: {0}")]
    CarrierLookup(String),

    // Catalog errors
    #[error("Load catalog error: {0}")]
    Catalog(String),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Access errors
    #[error("Invalid x-api-key")]
    Unauthorized,

    #[error("Public dashboard is disabled. Set PUBLIC_DASHBOARD=true.")]
    DashboardDisabled,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RateDeskError {
    /// Whether the error was caused by the caller's input rather than the desk
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RateDeskError::InvalidOffer(_)
                | RateDeskError::LoadNotFound(_)
                | RateDeskError::InvalidOutcome(_)
                | RateDeskError::InvalidRequest(_)
                | RateDeskError::Unauthorized
                | RateDeskError::DashboardDisabled
        )
    }
}

/// Result type alias for ratedesk operations
pub type Result<T> = std::result::Result<T, RateDeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RateDeskError::LoadNotFound("L999".to_string());
        assert_eq!(err.to_string(), "Load not found: L999");
    }

    #[test]
    fn test_result_type() {
        fn sample_function() -> Result<u32> {
            Ok(3)
        }

        let result = sample_function();
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_error_conversion() {
        fn io_error_function() -> Result<()> {
            std::fs::read_to_string("/nonexistent/loads.json")?;
            Ok(())
        }

        let result = io_error_function();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), RateDeskError::Io(_)));
    }

    #[test]
    fn test_invalid_outcome_message() {
        let err = RateDeskError::InvalidOutcome("final_price");
        assert_eq!(err.to_string(), "Invalid call outcome: missing final_price");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(RateDeskError::InvalidOffer("abc".to_string()).is_client_error());
        assert!(RateDeskError::Unauthorized.is_client_error());
        assert!(!RateDeskError::Internal("boom".to_string()).is_client_error());
        assert!(!RateDeskError::CarrierLookup("timeout".to_string()).is_client_error());
    }
}
