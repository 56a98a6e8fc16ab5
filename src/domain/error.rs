use thiserror::Error;

/// Core gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Circuit breaker '{name}' is open")]
    CircuitOpen { name: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Timed out after {millis}ms: {message}")]
    Timeout { millis: u64, message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn circuit_open(name: impl Into<String>) -> Self {
        Self::CircuitOpen { name: name.into() }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(millis: u64, message: impl Into<String>) -> Self {
        Self::Timeout {
            millis,
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the failure is worth retrying and countable by a circuit
    /// breaker. Configuration and validation faults are permanent.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = GatewayError::not_found("Experiment 'rollout' not found");
        assert_eq!(
            error.to_string(),
            "Not found: Experiment 'rollout' not found"
        );
    }

    #[test]
    fn test_validation_error() {
        let error = GatewayError::validation("Invalid input");
        assert_eq!(error.to_string(), "Validation error: Invalid input");
    }

    #[test]
    fn test_circuit_open_error() {
        let error = GatewayError::circuit_open("backend");
        assert_eq!(error.to_string(), "Circuit breaker 'backend' is open");
    }

    #[test]
    fn test_transient_classification() {
        assert!(GatewayError::provider("openai", "503").is_transient());
        assert!(GatewayError::timeout(5000, "chat completion").is_transient());
        assert!(!GatewayError::configuration("no credential").is_transient());
        assert!(!GatewayError::circuit_open("backend").is_transient());
    }
}
