//! Error types and handling for the travel assistant

use thiserror::Error;

/// Main error type for the travel assistant
#[derive(Error, Debug)]
pub enum TravelAssistantError {
    /// Missing or unusable configuration, typically an API key
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Network or HTTP status failure talking to an upstream service
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Upstream payload did not have the expected shape
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The query was superseded by a newer one
    #[error("Query cancelled")]
    Cancelled,

    /// An upstream call did not finish in time
    #[error("Timed out: {operation}")]
    Timeout { operation: String },
}

impl TravelAssistantError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new malformed response error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn timeout<S: Into<String>>(operation: S) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TravelAssistantError::Config { message } => {
                format!("Configuration error: {message}. Please supply the missing API key.")
            }
            TravelAssistantError::Transport { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            TravelAssistantError::MalformedResponse { .. } => {
                "An external service returned an unexpected answer. Please try again.".to_string()
            }
            TravelAssistantError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TravelAssistantError::Cancelled => {
                "This request was replaced by a newer one.".to_string()
            }
            TravelAssistantError::Timeout { .. } => {
                "An external service took too long to answer. Please try again.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for TravelAssistantError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let host = err.url().and_then(|url| url.host_str()).unwrap_or("upstream");
            return Self::timeout(format!("request to {host}"));
        }
        if err.is_decode() {
            return Self::malformed(err.to_string());
        }
        Self::transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = TravelAssistantError::config("missing API key");
        assert!(matches!(config_err, TravelAssistantError::Config { .. }));

        let transport_err = TravelAssistantError::transport("connection refused");
        assert!(matches!(transport_err, TravelAssistantError::Transport { .. }));

        let malformed_err = TravelAssistantError::malformed("missing longitude");
        assert!(matches!(
            malformed_err,
            TravelAssistantError::MalformedResponse { .. }
        ));
    }

    #[test]
    fn test_user_messages() {
        let config_err = TravelAssistantError::config("model API key is missing");
        assert!(config_err.user_message().contains("model API key is missing"));

        let transport_err = TravelAssistantError::transport("test");
        assert!(transport_err.user_message().contains("Unable to connect"));

        let validation_err = TravelAssistantError::validation("empty location");
        assert!(validation_err.user_message().contains("empty location"));
    }
}
