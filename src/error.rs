use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Setup-time failures. None of these are ever produced while a request is
/// being handled.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid problem type: {message}")]
    InvalidProblemType { message: String },

    #[error("Unknown dispatcher '{name}', expected one of: {expected}")]
    UnknownDispatcher { name: String, expected: String },

    #[error("Invalid status code {code}: {message}")]
    InvalidStatusCode { code: u16, message: String },

    #[error("Component '{name}' is already registered")]
    DuplicateComponent { name: String },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

impl ConfigError {
    pub fn invalid_problem_type(message: impl Into<String>) -> Self {
        Self::InvalidProblemType {
            message: message.into(),
        }
    }

    pub fn invalid_status(code: u16, message: impl Into<String>) -> Self {
        Self::InvalidStatusCode {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}
