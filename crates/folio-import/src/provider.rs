//! The import service seam.

use std::time::Duration;

use folio_core::{Result, ServiceHealth};
use uuid::Uuid;

use crate::candidate::{CandidateFile, CandidateSet};
use crate::dashboard::{Holdings, PortfolioStats, ValueHistory};
use crate::report::BatchReport;
use crate::snapshot::{
    SaveSnapshotRequest, SavedSnapshot, SnapshotDetail, SnapshotHistory, StatementPreview,
};

/// Multipart field name shared by every file of a batch.
pub const FILES_FIELD: &str = "files";

/// Multipart field name of a single-statement upload.
pub const FILE_FIELD: &str = "file";

/// One multipart request bundling every selected file.
///
/// Exists only for the duration of one call and is never retried.
#[derive(Debug, Clone)]
pub struct BatchSubmission {
    /// Identifier used to correlate logs.
    pub submission_id: Uuid,
    /// Files in selection order.
    pub files: Vec<CandidateFile>,
    /// Bound for the whole request; providers apply it in place of their
    /// default request timeout.
    pub timeout: Option<Duration>,
}

impl BatchSubmission {
    /// Wraps a validated selection.
    pub fn new(candidates: &CandidateSet) -> Self {
        Self {
            submission_id: Uuid::now_v7(),
            files: candidates.files().to_vec(),
            timeout: None,
        }
    }

    /// Sets the request bound for this submission.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Number of files in the submission.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns whether the submission is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total payload size in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Remote service that parses statements and stores snapshots.
///
/// Implement this trait to back the import flows with a transport.
#[async_trait::async_trait]
pub trait ImportProvider: Send + Sync {
    /// Submits a whole batch and returns one outcome per file.
    async fn submit_batch(&self, submission: &BatchSubmission) -> Result<BatchReport>;

    /// Uploads a single statement and returns its parsed preview.
    async fn upload_statement(&self, file: &CandidateFile) -> Result<StatementPreview>;

    /// Persists a confirmed preview.
    async fn save_snapshot(&self, request: &SaveSnapshotRequest) -> Result<SavedSnapshot>;

    /// Lists the most recent snapshots.
    async fn snapshot_history(&self, limit: usize) -> Result<SnapshotHistory>;

    /// Fetches one snapshot with its positions.
    async fn snapshot_detail(&self, snapshot_id: &str) -> Result<SnapshotDetail>;

    /// Headline figures of the latest snapshot.
    async fn portfolio_stats(&self) -> Result<PortfolioStats>;

    /// Positions of the latest snapshot.
    async fn holdings(&self) -> Result<Holdings>;

    /// Total value over time.
    async fn value_history(&self) -> Result<ValueHistory>;

    /// Performs a health check on the service.
    async fn health_check(&self) -> Result<ServiceHealth>;
}
