use thiserror::Error;

/// Domain error taxonomy shared by both payment endpoints
#[derive(Error, Debug)]
pub enum DomainError {
    /// Local input validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// The provider rejected the client identity
    #[error("Credential error: {0}")]
    Credential(String),

    /// Network failure, timeout or provider-side 5xx
    #[error("Payment provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider refused the push request
    #[error("Payment provider rejected request: {0}")]
    ProviderRejected(String),

    /// Callback body lacks the expected result envelope
    #[error("Malformed callback payload: {0}")]
    MalformedPayload(String),

    /// No order matched
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order store read or write failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DomainError {
    /// Machine-readable error code returned to clients
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "VALIDATION_ERROR",
            DomainError::Credential(_) => "CREDENTIAL_ERROR",
            DomainError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            DomainError::ProviderRejected(_) => "PROVIDER_REJECTED",
            DomainError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            DomainError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            DomainError::Persistence(_) | DomainError::Database(_) => "PERSISTENCE_ERROR",
            DomainError::Serialization(_) => "INTERNAL_ERROR",
            DomainError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::ProviderUnavailable(_)
                | DomainError::Persistence(_)
                | DomainError::Database(_)
        )
    }
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_taxonomy() {
        assert!(DomainError::ProviderUnavailable("timeout".into()).is_retryable());
        assert!(DomainError::Persistence("write failed".into()).is_retryable());
        assert!(!DomainError::Credential("bad key".into()).is_retryable());
        assert!(!DomainError::MalformedPayload("no body".into()).is_retryable());
    }

    #[test]
    fn test_codes() {
        assert_eq!(
            DomainError::OrderNotFound("x".into()).code(),
            "ORDER_NOT_FOUND"
        );
        assert_eq!(
            DomainError::Database(sqlx::Error::RowNotFound).code(),
            "PERSISTENCE_ERROR"
        );
    }
}
