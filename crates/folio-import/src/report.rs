//! Per-file outcomes and the aggregated batch report.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};

use crate::error::{ImportError, Result};

/// The service's verdict for one submitted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FileStatus {
    /// The statement was parsed and stored.
    Success,
    /// A snapshot for the same statement already exists.
    Duplicate,
    /// The file could not be processed.
    Error,
}

/// Outcome of one submitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Original filename as submitted.
    pub filename: String,
    /// Verdict for this file.
    pub status: FileStatus,
    /// Human-readable message.
    pub message: String,
    /// Statement date detected in the file (ISO `YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_date: Option<String>,
    /// Identifier of the stored snapshot; only present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    /// Additional detail; errors carry the cause, duplicates the earlier upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl FileOutcome {
    /// Returns whether this file was imported.
    pub fn is_success(&self) -> bool {
        self.status == FileStatus::Success
    }
}

/// Aggregated outcomes of one completed batch submission.
///
/// Outcomes arrive in whatever order the service chose; match them to
/// inputs with [`BatchReport::outcomes_for`], never by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Number of files the service processed.
    pub total_files: usize,
    /// Files imported.
    pub successful: usize,
    /// Files skipped as already imported.
    pub duplicates: usize,
    /// Files that failed.
    pub errors: usize,
    /// One outcome per submitted file.
    #[serde(default)]
    pub results: Vec<FileOutcome>,
}

impl BatchReport {
    /// Checks that the counters add up and that every counted file has an
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::BatchSubmissionFailed`] when
    /// `total_files != successful + duplicates + errors`, when the counters
    /// overflow, or when `results` does not hold exactly `total_files` entries.
    pub fn validate(&self) -> Result<()> {
        let sum = self
            .successful
            .checked_add(self.duplicates)
            .and_then(|sum| sum.checked_add(self.errors))
            .ok_or_else(|| {
                ImportError::submission_failed(
                    "Inconsistent import report: outcome counters overflow",
                )
            })?;

        if sum != self.total_files {
            return Err(ImportError::submission_failed(format!(
                "Inconsistent import report: {} files reported but {sum} outcomes counted",
                self.total_files
            )));
        }

        if self.results.len() != self.total_files {
            return Err(ImportError::submission_failed(format!(
                "Inconsistent import report: {} files reported but {} outcomes listed",
                self.total_files,
                self.results.len()
            )));
        }

        Ok(())
    }

    /// Checks the report against the number of files that were submitted.
    ///
    /// # Errors
    ///
    /// Everything [`BatchReport::validate`] rejects, and any report that does
    /// not account for exactly `submitted` files.
    pub fn validate_for(&self, submitted: usize) -> Result<()> {
        self.validate()?;

        if self.total_files != submitted {
            return Err(ImportError::submission_failed(format!(
                "Inconsistent import report: {submitted} files submitted but {} reported",
                self.total_files
            )));
        }

        Ok(())
    }

    /// Every outcome reported for `filename`.
    ///
    /// More than one outcome is returned when the batch held several files
    /// with the same name.
    pub fn outcomes_for<'a>(&'a self, filename: &'a str) -> impl Iterator<Item = &'a FileOutcome> {
        self.results.iter().filter(move |o| o.filename == filename)
    }

    /// Number of detailed outcomes with the given status.
    pub fn count(&self, status: FileStatus) -> usize {
        self.results.iter().filter(|o| o.status == status).count()
    }

    /// Classifies the batch for user feedback.
    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from(self)
    }
}

/// Caller-side classification of a completed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSummary {
    /// At least one file was imported.
    Processed {
        successful: usize,
        duplicates: usize,
        errors: usize,
    },
    /// Nothing was imported, only duplicates were found.
    AllDuplicates { duplicates: usize },
    /// Nothing was imported and at least one file failed.
    Failed { errors: usize },
}

impl BatchSummary {
    /// Returns whether any statement was imported.
    pub fn imported_any(&self) -> bool {
        matches!(self, Self::Processed { .. })
    }
}

impl From<&BatchReport> for BatchSummary {
    fn from(report: &BatchReport) -> Self {
        if report.successful > 0 {
            Self::Processed {
                successful: report.successful,
                duplicates: report.duplicates,
                errors: report.errors,
            }
        } else if report.duplicates > 0 && report.errors == 0 {
            Self::AllDuplicates {
                duplicates: report.duplicates,
            }
        } else {
            Self::Failed {
                errors: report.errors,
            }
        }
    }
}
