//! Transient user notifications raised by the import flows.

use std::fmt;

use strum::{AsRefStr, Display};

use crate::TRACING_TARGET_NOTIFICATION;
use crate::error::ImportError;
use crate::report::BatchSummary;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// A short message shown to the user once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Headline.
    pub title: String,
    /// Secondary line.
    pub description: String,
}

impl Notification {
    /// Creates a notification.
    pub fn new(
        level: NotificationLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

impl From<BatchSummary> for Notification {
    fn from(summary: BatchSummary) -> Self {
        match summary {
            BatchSummary::Processed {
                successful,
                duplicates,
                errors,
            } => Self::new(
                NotificationLevel::Success,
                format!("{successful} files processed successfully"),
                format!("Duplicates: {duplicates}, Errors: {errors}"),
            ),
            BatchSummary::AllDuplicates { duplicates } => Self::new(
                NotificationLevel::Info,
                "All files already exist",
                format!("{duplicates} duplicates detected"),
            ),
            BatchSummary::Failed { errors } => Self::new(
                NotificationLevel::Error,
                "Failed to process files",
                format!("{errors} errors found"),
            ),
        }
    }
}

impl From<&ImportError> for Notification {
    fn from(error: &ImportError) -> Self {
        let title = match error {
            ImportError::InvalidSelection { .. } => "Invalid file type",
            ImportError::BatchTooLarge { .. } => "Too many files",
            ImportError::BatchSubmissionFailed { .. } => "Bulk upload error",
        };

        Self::new(NotificationLevel::Error, title, error.user_message())
    }
}

/// Receives notifications for display.
pub trait Notifier: Send + Sync {
    /// Shows a notification to the user.
    fn notify(&self, notification: Notification);
}

/// Notifier that writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => tracing::warn!(
                target: TRACING_TARGET_NOTIFICATION,
                title = %notification.title,
                description = %notification.description,
                "Notification"
            ),
            _ => tracing::info!(
                target: TRACING_TARGET_NOTIFICATION,
                level = %notification.level,
                title = %notification.title,
                description = %notification.description,
                "Notification"
            ),
        }
    }
}
