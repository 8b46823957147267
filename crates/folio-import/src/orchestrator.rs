//! Bulk import orchestration: selection, submission and reconciliation.

use std::sync::Arc;
use std::time::Duration;

use strum::{AsRefStr, Display};

use crate::TRACING_TARGET_ORCHESTRATOR;
use crate::candidate::{CandidateFile, CandidateSet};
use crate::error::{ImportError, Result};
use crate::invalidation::{
    InvalidationBus, InvalidationReason, InvalidationSignal, InvalidationTopic,
};
use crate::notification::{Notification, Notifier};
use crate::provider::BatchSubmission;
use crate::report::BatchReport;
use crate::service::ImportService;

/// Default upper bound for one batch submission: 2 minutes.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Topics invalidated after a batch that imported at least one file.
    pub topics: Vec<InvalidationTopic>,
    /// Upper bound for one submission, including the server's processing.
    pub submit_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            topics: InvalidationTopic::ALL.to_vec(),
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
        }
    }
}

impl OrchestratorConfig {
    /// Replaces the invalidated topics.
    #[must_use]
    pub fn with_topics(mut self, topics: impl IntoIterator<Item = InvalidationTopic>) -> Self {
        self.topics = topics.into_iter().collect();
        self
    }

    /// Sets the submission timeout. Zero keeps the default.
    #[must_use]
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.submit_timeout = timeout;
        }
        self
    }
}

/// Lifecycle of one orchestrator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ImportState {
    /// Nothing selected.
    #[default]
    Idle,
    /// A validated selection awaits submission.
    Selected,
    /// A submission is in flight.
    Submitting,
    /// The last submission completed and its report is held.
    Reported,
}

/// Restores `Selected` if a submission is abandoned mid-flight.
struct SubmittingGuard<'a> {
    state: &'a mut ImportState,
}

impl<'a> SubmittingGuard<'a> {
    fn enter(state: &'a mut ImportState) -> Self {
        *state = ImportState::Submitting;
        Self { state }
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        if *self.state == ImportState::Submitting {
            *self.state = ImportState::Selected;
        }
    }
}

/// Turns a user's file selection into a submitted batch and a report.
///
/// The orchestrator owns the selection, the last report and the last error
/// message. Submission takes `&mut self`, so one instance never has two
/// batches in flight.
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use folio_import::{BroadcastBus, BulkImportOrchestrator, TracingNotifier};
///
/// let mut orchestrator = BulkImportOrchestrator::new(
///     service,
///     Arc::new(BroadcastBus::default()),
///     Arc::new(TracingNotifier),
/// );
///
/// orchestrator.select_files(files)?;
/// let report = orchestrator.submit_batch().await?;
/// println!("{} imported", report.successful);
/// ```
pub struct BulkImportOrchestrator {
    service: ImportService,
    bus: Arc<dyn InvalidationBus>,
    notifier: Arc<dyn Notifier>,
    config: OrchestratorConfig,
    state: ImportState,
    candidates: CandidateSet,
    report: Option<BatchReport>,
    last_error: Option<String>,
}

impl std::fmt::Debug for BulkImportOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkImportOrchestrator")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("candidates", &self.candidates.len())
            .field("has_report", &self.report.is_some())
            .finish_non_exhaustive()
    }
}

impl BulkImportOrchestrator {
    /// Creates an idle orchestrator with the default configuration.
    pub fn new(
        service: ImportService,
        bus: Arc<dyn InvalidationBus>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            service,
            bus,
            notifier,
            config: OrchestratorConfig::default(),
            state: ImportState::Idle,
            candidates: CandidateSet::default(),
            report: None,
            last_error: None,
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Current state.
    pub fn state(&self) -> ImportState {
        self.state
    }

    /// Current selection.
    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// Report of the last completed batch, if still held.
    pub fn report(&self) -> Option<&BatchReport> {
        self.report.as_ref()
    }

    /// Message of the last submission failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Configuration in use.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Replaces the selection with the PDFs found in `candidates`.
    ///
    /// On failure a notification is raised and the previous selection, state
    /// and report are left untouched.
    ///
    /// # Errors
    ///
    /// - [`ImportError::InvalidSelection`] if no PDF is present.
    /// - [`ImportError::BatchTooLarge`] if more than 100 PDFs are present.
    pub fn select_files(
        &mut self,
        candidates: impl IntoIterator<Item = CandidateFile>,
    ) -> Result<&CandidateSet> {
        match CandidateSet::select(candidates) {
            Ok(selection) => {
                tracing::debug!(
                    target: TRACING_TARGET_ORCHESTRATOR,
                    files = selection.len(),
                    bytes = selection.total_size(),
                    previous_state = %self.state,
                    "Selection replaced"
                );

                self.candidates = selection;
                self.state = ImportState::Selected;
                Ok(&self.candidates)
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_ORCHESTRATOR,
                    error = %error,
                    "Selection rejected"
                );

                self.notifier.notify(Notification::from(&error));
                Err(error)
            }
        }
    }

    /// Submits the current selection as one batch.
    ///
    /// On success the selection is cleared, the report is held, a summary
    /// notification is raised and, if anything was imported, one invalidation
    /// signal is published. On failure the selection is kept for a retry and
    /// the previous report is dropped. If the returned future is dropped
    /// before completing, the previous report and error are left as they were.
    ///
    /// # Errors
    ///
    /// - [`ImportError::BatchSubmissionFailed`] if the request fails, times
    ///   out, or the service returns a report that is inconsistent or does not
    ///   account for every submitted file.
    /// - [`ImportError::InvalidSelection`] if called with nothing selected.
    pub async fn submit_batch(&mut self) -> Result<&BatchReport> {
        if self.candidates.is_empty() {
            tracing::warn!(
                target: TRACING_TARGET_ORCHESTRATOR,
                state = %self.state,
                "Submit called without a selection"
            );
            return Err(ImportError::invalid_selection("no files selected"));
        }

        let submission =
            BatchSubmission::new(&self.candidates).with_timeout(self.config.submit_timeout);

        tracing::info!(
            target: TRACING_TARGET_ORCHESTRATOR,
            submission_id = %submission.submission_id,
            files = submission.len(),
            timeout_secs = self.config.submit_timeout.as_secs(),
            "Submitting batch"
        );

        let outcome = {
            let _guard = SubmittingGuard::enter(&mut self.state);
            tokio::time::timeout(
                self.config.submit_timeout,
                self.service.submit_batch(&submission),
            )
            .await
        };

        let result = match outcome {
            Ok(Ok(report)) => report.validate_for(submission.len()).map(|()| report),
            Ok(Err(error)) => Err(ImportError::from(error)),
            Err(_elapsed) => Err(ImportError::BatchSubmissionFailed {
                message: "Request timed out".to_owned(),
                source: Some(folio_core::Error::timeout()),
            }),
        };

        match result {
            Ok(report) => Ok(self.complete(report)),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_ORCHESTRATOR,
                    submission_id = %submission.submission_id,
                    error = %error,
                    retained = self.candidates.len(),
                    "Batch submission failed, selection kept for retry"
                );

                self.state = ImportState::Selected;
                self.report = None;
                self.last_error = Some(error.user_message());
                self.notifier.notify(Notification::from(&error));
                Err(error)
            }
        }
    }

    /// Clears the selection, report and error state.
    pub fn reset_batch(&mut self) {
        self.candidates.clear();
        self.report = None;
        self.last_error = None;
        self.state = ImportState::Idle;
    }

    fn complete(&mut self, report: BatchReport) -> &BatchReport {
        let summary = report.summary();

        if summary.imported_any() && !self.config.topics.is_empty() {
            self.bus.invalidate(InvalidationSignal::new(
                self.config.topics.iter().copied(),
                InvalidationReason::BatchImported {
                    successful: report.successful,
                },
            ));
        }

        self.notifier.notify(Notification::from(summary));
        self.candidates.clear();
        self.last_error = None;
        self.state = ImportState::Reported;
        self.report.insert(report)
    }
}
