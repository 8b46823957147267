//! Import service wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use folio_core::{Result, ServiceHealth};

use crate::TRACING_TARGET_SERVICE;
use crate::candidate::CandidateFile;
use crate::dashboard::{Holdings, PortfolioStats, ValueHistory};
use crate::provider::{BatchSubmission, ImportProvider};
use crate::report::BatchReport;
use crate::snapshot::{
    SaveSnapshotRequest, SavedSnapshot, SnapshotDetail, SnapshotHistory, StatementPreview,
};

/// Import service wrapper with observability.
///
/// This wrapper adds structured logging to any [`ImportProvider`].
/// The inner provider is wrapped in `Arc` for cheap cloning.
#[derive(Clone)]
pub struct ImportService {
    inner: Arc<dyn ImportProvider>,
}

impl fmt::Debug for ImportService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportService").finish_non_exhaustive()
    }
}

impl ImportService {
    /// Create a new import service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: ImportProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Wraps an already shared provider.
    pub fn from_arc(provider: Arc<dyn ImportProvider>) -> Self {
        Self { inner: provider }
    }

    /// Submits a batch of statements.
    pub async fn submit_batch(&self, submission: &BatchSubmission) -> Result<BatchReport> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET_SERVICE,
            submission_id = %submission.submission_id,
            files = submission.len(),
            bytes = submission.total_size(),
            "Submitting import batch"
        );

        let result = self.inner.submit_batch(submission).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(report) => tracing::info!(
                target: TRACING_TARGET_SERVICE,
                submission_id = %submission.submission_id,
                total_files = report.total_files,
                successful = report.successful,
                duplicates = report.duplicates,
                errors = report.errors,
                elapsed_ms = elapsed.as_millis(),
                "Import batch processed"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET_SERVICE,
                submission_id = %submission.submission_id,
                error = %error,
                elapsed_ms = elapsed.as_millis(),
                "Import batch failed"
            ),
        }

        result
    }

    /// Uploads one statement for preview.
    pub async fn upload_statement(&self, file: &CandidateFile) -> Result<StatementPreview> {
        let started_at = Instant::now();
        let result = self.inner.upload_statement(file).await;

        match &result {
            Ok(preview) => tracing::debug!(
                target: TRACING_TARGET_SERVICE,
                filename = %file.name,
                detected_date = %preview.metadata.detected_date,
                positions = preview.breakdown.len(),
                elapsed_ms = started_at.elapsed().as_millis(),
                "Statement parsed"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET_SERVICE,
                filename = %file.name,
                error = %error,
                "Statement upload failed"
            ),
        }

        result
    }

    /// Persists a confirmed statement.
    pub async fn save_snapshot(&self, request: &SaveSnapshotRequest) -> Result<SavedSnapshot> {
        let result = self.inner.save_snapshot(request).await;

        match &result {
            Ok(saved) => tracing::info!(
                target: TRACING_TARGET_SERVICE,
                snapshot_id = %saved.snapshot_id,
                statement_date = %request.snapshot_data.statement_date,
                "Snapshot saved"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET_SERVICE,
                statement_date = %request.snapshot_data.statement_date,
                error = %error,
                "Snapshot save failed"
            ),
        }

        result
    }

    /// Lists the most recent snapshots.
    pub async fn snapshot_history(&self, limit: usize) -> Result<SnapshotHistory> {
        self.inner.snapshot_history(limit).await
    }

    /// Fetches one snapshot with its positions.
    pub async fn snapshot_detail(&self, snapshot_id: &str) -> Result<SnapshotDetail> {
        self.inner.snapshot_detail(snapshot_id).await
    }

    /// Fetches the stats panel figures.
    pub async fn portfolio_stats(&self) -> Result<PortfolioStats> {
        let result = self.inner.portfolio_stats().await;

        if let Err(error) = &result {
            tracing::warn!(
                target: TRACING_TARGET_SERVICE,
                error = %error,
                "Failed to fetch portfolio stats"
            );
        }

        result
    }

    /// Fetches the holdings of the latest snapshot.
    pub async fn holdings(&self) -> Result<Holdings> {
        let result = self.inner.holdings().await;

        match &result {
            Ok(holdings) => tracing::debug!(
                target: TRACING_TARGET_SERVICE,
                count = holdings.items.len(),
                "Holdings fetched"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET_SERVICE,
                error = %error,
                "Failed to fetch holdings"
            ),
        }

        result
    }

    /// Fetches the total-value chart.
    pub async fn value_history(&self) -> Result<ValueHistory> {
        self.inner.value_history().await
    }

    /// Checks backend health.
    pub async fn health_check(&self) -> Result<ServiceHealth> {
        self.inner.health_check().await
    }
}
