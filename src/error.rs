//! Error types and handling for the travel directory

use thiserror::Error;

use crate::integrations::IntegrationError;

/// Main error type for the travel directory
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// External API communication errors
    #[error("API error: {source}")]
    Api {
        #[from]
        source: IntegrationError,
    },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Caller is not signed in
    #[error("Authentication required")]
    Unauthenticated,

    /// Caller is signed in but lacks the required role or ownership
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Requested record does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Unique constraint violations
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Data service (table API) errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl DirectoryError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            DirectoryError::Config { .. } => {
                "Service is not configured. Please contact the site administrator.".to_string()
            }
            DirectoryError::Api { .. } => {
                "Unable to reach an external service. Please try again later.".to_string()
            }
            DirectoryError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            DirectoryError::Unauthenticated => "Please log in to continue.".to_string(),
            DirectoryError::Forbidden { .. } => {
                "You do not have permission to perform this action.".to_string()
            }
            DirectoryError::NotFound { message } => message.clone(),
            DirectoryError::Conflict { message } => message.clone(),
            DirectoryError::Storage { .. } => {
                "Something went wrong while loading data. Please try again.".to_string()
            }
            DirectoryError::Cache { .. } => {
                "Session storage failed. Please start a new session.".to_string()
            }
            DirectoryError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            DirectoryError::General { message } => message.clone(),
        }
    }
}

impl From<anyhow::Error> for DirectoryError {
    fn from(err: anyhow::Error) -> Self {
        DirectoryError::General {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = DirectoryError::config("missing data service url");
        assert!(matches!(config_err, DirectoryError::Config { .. }));

        let conflict = DirectoryError::conflict("duplicate slug");
        assert!(matches!(conflict, DirectoryError::Conflict { .. }));

        let validation_err = DirectoryError::validation("title is required");
        assert!(matches!(validation_err, DirectoryError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = DirectoryError::config("test");
        assert!(config_err.user_message().contains("not configured"));

        let validation_err = DirectoryError::validation("title is required");
        assert!(validation_err.user_message().contains("title is required"));

        let conflict = DirectoryError::conflict("You have already requested access to this agency.");
        assert_eq!(
            conflict.user_message(),
            "You have already requested access to this agency."
        );
    }

    #[test]
    fn test_integration_error_conversion() {
        let err: DirectoryError = IntegrationError::NotConfigured("OPENAI".to_string()).into();
        assert!(matches!(err, DirectoryError::Api { .. }));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DirectoryError = io_err.into();
        assert!(matches!(err, DirectoryError::Io { .. }));
    }
}
