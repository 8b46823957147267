//! Internal error types for folio-reqwest.

use folio_core::ErrorKind;
use thiserror::Error;

/// Result type alias for folio-reqwest operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Internal error type for folio-reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },
    /// An access token could not be obtained.
    #[error("Token error: {0}")]
    Token(String),
}

impl From<Error> for folio_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    folio_core::Error::timeout()
                        .with_message("Request timed out")
                        .with_source(e)
                } else if e.is_connect() {
                    folio_core::Error::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else if e.is_decode() {
                    folio_core::Error::serialization()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    folio_core::Error::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => folio_core::Error::serialization()
                .with_message(e.to_string())
                .with_source(e),
            Error::Config(message) => folio_core::Error::configuration().with_message(message),
            Error::Api { status, message } => {
                folio_core::Error::from_status(status).with_message(message)
            }
            Error::Token(message) => {
                folio_core::Error::new(ErrorKind::Authentication).with_message(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_keeps_status_kind_and_message() {
        let error: folio_core::Error = Error::Api {
            status: 404,
            message: "Portfolio not found. Please create one first.".into(),
        }
        .into();

        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(
            error.message(),
            Some("Portfolio not found. Please create one first.")
        );
    }

    #[test]
    fn test_config_error_kind() {
        let error: folio_core::Error = Error::Config("bad url".into()).into();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }
}
