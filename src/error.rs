// Error types for the Monte Carlo control engine
// Only two fatal conditions exist at this layer; retries belong to the host

use thiserror::Error;

/// Main error type for the mc-control engine
#[derive(Error, Debug)]
pub enum McError {
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Environment protocol error: {message}")]
    EnvironmentProtocol { message: String },
}

impl McError {
    /// Create a new invalid configuration error
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a new environment protocol error
    pub fn environment_protocol(message: impl Into<String>) -> Self {
        Self::EnvironmentProtocol {
            message: message.into(),
        }
    }

    /// Whether this error was raised by the environment collaborator
    pub fn is_environment_error(&self) -> bool {
        matches!(self, Self::EnvironmentProtocol { .. })
    }
}

/// Result type used throughout the engine
pub type McResult<T> = Result<T, McError>;
