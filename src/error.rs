use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Network error: {0}")]
    #[diagnostic(code(kalenteri::transport))]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    #[diagnostic(code(kalenteri::backend))]
    Backend(String),

    #[error("Speech error: {0}")]
    #[diagnostic(code(kalenteri::speech))]
    Speech(String),

    #[error("Unsupported feature: {0}")]
    #[diagnostic(code(kalenteri::unsupported))]
    Unsupported(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(kalenteri::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(kalenteri::config))]
    Config(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(kalenteri::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(kalenteri::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(kalenteri::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(kalenteri::other))]
    Other(String),
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create errors reported by the backend
pub fn backend_error(message: &str) -> Error {
    Error::Backend(message.to_string())
}

/// Helper to create speech input/output errors
pub fn speech_error(message: &str) -> Error {
    Error::Speech(message.to_string())
}

/// Helper to create unsupported capability errors
pub fn unsupported_error(message: &str) -> Error {
    Error::Unsupported(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
