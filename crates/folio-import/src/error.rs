//! Errors surfaced by the import flows.

use thiserror::Error;

/// Result type alias for import operations.
pub type Result<T, E = ImportError> = std::result::Result<T, E>;

/// Message used when a submission fails without any usable detail.
pub const GENERIC_FAILURE_MESSAGE: &str = "Error processing files";

/// User-facing failures of the import flows.
///
/// Every variant is recoverable: the user either re-selects files or retries.
/// Per-file failures are not errors; they are delivered as
/// [`FileStatus::Error`](crate::FileStatus::Error) outcomes inside a report.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The selection contained nothing that can be imported.
    #[error("invalid selection: {message}")]
    InvalidSelection {
        /// What was wrong with the selection.
        message: String,
    },

    /// The selection holds more PDFs than one batch accepts.
    #[error("batch too large: {count} files selected, at most {limit} allowed")]
    BatchTooLarge {
        /// Number of PDF files in the rejected selection.
        count: usize,
        /// Maximum number of files per batch.
        limit: usize,
    },

    /// The import service could not be reached or rejected the whole batch.
    #[error("batch submission failed: {message}")]
    BatchSubmissionFailed {
        /// Best available description of the failure.
        message: String,
        /// Underlying service error, if any.
        #[source]
        source: Option<folio_core::Error>,
    },
}

impl ImportError {
    /// Creates an [`ImportError::InvalidSelection`].
    pub fn invalid_selection(message: impl Into<String>) -> Self {
        Self::InvalidSelection {
            message: message.into(),
        }
    }

    /// Creates an [`ImportError::BatchSubmissionFailed`] with only a message.
    pub fn submission_failed(message: impl Into<String>) -> Self {
        Self::BatchSubmissionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Returns the message shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidSelection { message } => message.clone(),
            Self::BatchTooLarge { limit, .. } => format!("Maximum {limit} files per batch"),
            Self::BatchSubmissionFailed { message, .. } => message.clone(),
        }
    }
}

impl From<folio_core::Error> for ImportError {
    /// Keeps the service-supplied message when there is one, otherwise falls
    /// back to a generic message. The raw error stays available as the source.
    fn from(error: folio_core::Error) -> Self {
        let message = error
            .message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(GENERIC_FAILURE_MESSAGE)
            .to_owned();

        Self::BatchSubmissionFailed {
            message,
            source: Some(error),
        }
    }
}
