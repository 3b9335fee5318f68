//! Error types and handling for the Lawander engine

use thiserror::Error;

/// Main error type for the Lawander engine
#[derive(Error, Debug)]
pub enum LawanderError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Geocoding service communication errors
    #[error("Geocoding error: {message}")]
    Geocoding { message: String },

    /// Chat backend communication errors
    #[error("Chat backend error: {message}")]
    Chat { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl LawanderError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new geocoding error
    pub fn geocoding<S: Into<String>>(message: S) -> Self {
        Self::Geocoding {
            message: message.into(),
        }
    }

    /// Create a new chat backend error
    pub fn chat<S: Into<String>>(message: S) -> Self {
        Self::Chat {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            LawanderError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            LawanderError::Geocoding { .. } => {
                "Unable to reach the map search service. Please try again later.".to_string()
            }
            LawanderError::Chat { .. } => {
                "Sorry, I'm having trouble connecting to the server. Please try again later."
                    .to_string()
            }
            LawanderError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            LawanderError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            LawanderError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
