//! Error types for the emitter

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A required environment variable is unset or empty
    #[error("Environment variable {name} is not set")]
    MissingEnvironment { name: String },

    /// Handler rejected or failed to output a record
    #[error("Handler '{handler}' failed: {message}")]
    HandlerError { handler: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a missing environment variable error
    pub fn missing_env(name: impl Into<String>) -> Self {
        LoggerError::MissingEnvironment { name: name.into() }
    }

    /// Create a handler error
    pub fn handler(handler: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::HandlerError {
            handler: handler.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
