/// Error types for the iBooks client.
/// Every operation boundary converts these into a user-visible message.

use std::io;
use thiserror::Error;

/// Fallback shown when a backend failure carries no message of its own
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Shown for transport failures and unreadable responses
pub const CONNECTIVITY_FAILURE: &str =
    "Error connecting to server. Please check your connection and try again.";

#[derive(Error, Debug)]
pub enum ClientError {
    /// An action that needs a session was attempted without one
    #[error("Please login to continue")]
    Unauthenticated,

    #[error("Access denied: {0}")]
    Forbidden(String),

    /// A local precondition failed; no request was sent
    #[error("{0}")]
    Validation(String),

    #[error("Request failed ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Message suitable for showing next to the action that failed.
    ///
    /// Backend-supplied messages are passed through verbatim; transport and
    /// decoding failures collapse into a generic connectivity message.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Unauthenticated => "Please login to continue".to_string(),
            ClientError::Forbidden(_) => "Access denied. Admins only.".to_string(),
            ClientError::Validation(message) | ClientError::InvalidCommand(message) => {
                message.clone()
            }
            ClientError::Client { message, .. } | ClientError::Server { message, .. } => {
                if message.trim().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    message.clone()
                }
            }
            ClientError::Network(_) | ClientError::Parse(_) => CONNECTIVITY_FAILURE.to_string(),
            other => other.to_string(),
        }
    }

    /// True when the caller should prompt for login
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthenticated | ClientError::Client { status: 401, .. }
        )
    }

    /// HTTP status of a backend failure, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Client { status, .. } | ClientError::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
