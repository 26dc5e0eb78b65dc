//! Error types for the product search client.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Generic text shown for transport-level failures.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors that can occur while talking to the product search API.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport error (connection refused, reset, body read failure)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Application-level error reported in the response body
    #[error("API error: {0}")]
    Api(String),

    /// Explicit error event on the chat stream, or a stream that could not be completed
    #[error("Stream error: {0}")]
    Stream(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Local file could not be read or written
    #[error("Cannot access {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Another request of the same kind is still in flight
    #[error("A request is already in progress")]
    Busy,
}

impl Error {
    /// Text to show the user in place of results or as a chat error turn.
    ///
    /// Transport failures collapse to a generic message; errors reported by the
    /// backend are shown verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api(message) | Error::Stream(message) => message.clone(),
            Error::Validation(message) => message.clone(),
            Error::Busy | Error::File { .. } => self.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Whether this failure happened below the application protocol.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Status { .. })
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_by_category() {
        let status = Error::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(status.user_message(), GENERIC_ERROR_MESSAGE);
        assert!(status.is_transport());

        let api = Error::Api("Product not found".to_string());
        assert_eq!(api.user_message(), "Product not found");
        assert!(!api.is_transport());

        let stream = Error::Stream("model overloaded".to_string());
        assert_eq!(stream.user_message(), "model overloaded");

        let file = Error::File {
            path: "ids.csv".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(file.user_message(), "Cannot access ids.csv: not found");
        assert!(!file.is_transport());
    }
}
