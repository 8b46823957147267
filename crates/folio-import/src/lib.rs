#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod candidate;
mod dashboard;
mod error;
mod invalidation;
mod notification;
mod orchestrator;
mod provider;
mod report;
mod service;
mod snapshot;
mod statement;

#[cfg(any(test, feature = "mock"))]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub mod mock;

pub use candidate::{CandidateFile, CandidateSet, MAX_BATCH_FILES, PDF_MEDIA_TYPE, media_type_for};
pub use dashboard::{
    FinancialValue, Holding, HoldingDetails, HoldingFinancials, Holdings, Performance,
    PortfolioStats, Trend, ValueHistory, ValuePoint,
};
pub use error::{GENERIC_FAILURE_MESSAGE, ImportError, Result};
pub use invalidation::{
    BroadcastBus, InvalidationBus, InvalidationReason, InvalidationSignal, InvalidationTopic,
};
pub use notification::{Notification, NotificationLevel, Notifier, TracingNotifier};
pub use orchestrator::{
    BulkImportOrchestrator, DEFAULT_SUBMIT_TIMEOUT, ImportState, OrchestratorConfig,
};
pub use provider::{BatchSubmission, FILE_FIELD, FILES_FIELD, ImportProvider};
pub use report::{BatchReport, BatchSummary, FileOutcome, FileStatus};
pub use service::ImportService;
pub use snapshot::{
    PortfolioSummary, Position, SaveSnapshotRequest, SavedSnapshot, SnapshotData, SnapshotDetail,
    SnapshotFileMetadata, SnapshotHistory, SnapshotSummary, StatementMetadata, StatementPreview,
};
pub use statement::StatementImport;

/// Tracing target for file selection.
pub const TRACING_TARGET_SELECTION: &str = "folio_import::selection";

/// Tracing target for batch orchestration.
pub const TRACING_TARGET_ORCHESTRATOR: &str = "folio_import::orchestrator";

/// Tracing target for import service calls.
pub const TRACING_TARGET_SERVICE: &str = "folio_import::service";

/// Tracing target for single-statement imports.
pub const TRACING_TARGET_STATEMENT: &str = "folio_import::statement";

/// Tracing target for user notifications.
pub const TRACING_TARGET_NOTIFICATION: &str = "folio_import::notification";

/// Tracing target for cache invalidation.
pub const TRACING_TARGET_INVALIDATION: &str = "folio_import::invalidation";
