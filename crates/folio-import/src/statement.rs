//! Single-statement import: preview first, then confirm.

use std::sync::Arc;

use crate::TRACING_TARGET_STATEMENT;
use crate::candidate::CandidateFile;
use crate::error::{ImportError, Result};
use crate::invalidation::{
    InvalidationBus, InvalidationReason, InvalidationSignal, InvalidationTopic,
};
use crate::service::ImportService;
use crate::snapshot::{SaveSnapshotRequest, SavedSnapshot, StatementPreview};

/// Two-step import of one statement.
///
/// [`preview`](Self::preview) lets the user inspect what the parser found;
/// nothing is stored until [`confirm`](Self::confirm).
#[derive(Clone)]
pub struct StatementImport {
    service: ImportService,
    bus: Arc<dyn InvalidationBus>,
    topics: Vec<InvalidationTopic>,
}

impl std::fmt::Debug for StatementImport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementImport")
            .field("topics", &self.topics)
            .finish_non_exhaustive()
    }
}

impl StatementImport {
    /// Creates the flow, invalidating every topic on confirm.
    pub fn new(service: ImportService, bus: Arc<dyn InvalidationBus>) -> Self {
        Self {
            service,
            bus,
            topics: InvalidationTopic::ALL.to_vec(),
        }
    }

    /// Replaces the topics invalidated on confirm.
    #[must_use]
    pub fn with_topics(mut self, topics: impl IntoIterator<Item = InvalidationTopic>) -> Self {
        self.topics = topics.into_iter().collect();
        self
    }

    /// Uploads `file` and returns the parsed statement without storing it.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::InvalidSelection`] for non-PDF files and
    /// [`ImportError::BatchSubmissionFailed`] if the upload fails.
    pub async fn preview(&self, file: &CandidateFile) -> Result<StatementPreview> {
        if !file.is_pdf() {
            tracing::warn!(
                target: TRACING_TARGET_STATEMENT,
                filename = %file.name,
                media_type = %file.media_type,
                "Statement rejected, not a PDF"
            );
            return Err(ImportError::invalid_selection("Only PDF files are allowed"));
        }

        Ok(self.service.upload_statement(file).await?)
    }

    /// Stores a previewed statement and invalidates dependent views.
    ///
    /// The request carries the SHA-256 of `file` so the service can reject
    /// a statement that was already imported.
    pub async fn confirm(
        &self,
        file: &CandidateFile,
        preview: &StatementPreview,
    ) -> Result<SavedSnapshot> {
        let request = SaveSnapshotRequest::from_preview(preview, file.sha256());

        tracing::debug!(
            target: TRACING_TARGET_STATEMENT,
            filename = %file.name,
            file_hash = %request.file_hash,
            statement_date = %request.snapshot_data.statement_date,
            "Confirming statement"
        );

        let saved = self.service.save_snapshot(&request).await?;

        if !self.topics.is_empty() {
            self.bus.invalidate(InvalidationSignal::new(
                self.topics.iter().copied(),
                InvalidationReason::SnapshotSaved {
                    snapshot_id: saved.snapshot_id.clone(),
                },
            ));
        }

        Ok(saved)
    }
}
