//! In-memory implementations for tests.
//!
//! Enabled with the `mock` feature.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use folio_core::{Error, ErrorKind, Result, ServiceHealth};

use crate::candidate::CandidateFile;
use crate::dashboard::{
    FinancialValue, Holding, HoldingDetails, HoldingFinancials, Holdings, Performance,
    PortfolioStats, ValueHistory, ValuePoint,
};
use crate::invalidation::{InvalidationBus, InvalidationSignal};
use crate::notification::{Notification, Notifier};
use crate::provider::{BatchSubmission, ImportProvider};
use crate::report::{BatchReport, FileOutcome, FileStatus};
use crate::snapshot::{
    PortfolioSummary, SaveSnapshotRequest, SavedSnapshot, SnapshotDetail, SnapshotHistory,
    SnapshotSummary, StatementMetadata, StatementPreview,
};

/// Statement date reported by the mock parser.
pub const MOCK_STATEMENT_DATE: &str = "2024-01-31";

/// How [`MockImportProvider`] answers a batch submission.
#[derive(Debug, Clone)]
pub enum MockBatchBehavior {
    /// Every submitted file succeeds.
    EchoSuccess,
    /// Returns this report as-is.
    Report(BatchReport),
    /// Fails with this error.
    Fail {
        kind: ErrorKind,
        message: Option<String>,
    },
    /// Never answers.
    Hang,
}

#[derive(Debug)]
struct MockState {
    behavior: MockBatchBehavior,
    delay: Option<Duration>,
    submissions: Vec<BatchSubmission>,
    saved: Vec<SaveSnapshotRequest>,
}

/// Scripted import provider recording every call.
///
/// Clones share state, so a test can keep a handle after moving one into
/// an [`ImportService`](crate::ImportService).
#[derive(Debug, Clone)]
pub struct MockImportProvider {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockImportProvider {
    fn default() -> Self {
        Self::new(MockBatchBehavior::EchoSuccess)
    }
}

impl MockImportProvider {
    /// Creates a provider answering batches with `behavior`.
    pub fn new(behavior: MockBatchBehavior) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                behavior,
                delay: None,
                submissions: Vec::new(),
                saved: Vec::new(),
            })),
        }
    }

    /// Delays every batch answer by `delay`.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    /// Replaces the batch behavior.
    pub fn set_behavior(&self, behavior: MockBatchBehavior) {
        self.lock().behavior = behavior;
    }

    /// Batches received so far.
    pub fn submissions(&self) -> Vec<BatchSubmission> {
        self.lock().submissions.clone()
    }

    /// Save requests received so far.
    pub fn saved(&self) -> Vec<SaveSnapshotRequest> {
        self.lock().saved.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn echo_report(submission: &BatchSubmission) -> BatchReport {
    let results: Vec<_> = submission
        .files
        .iter()
        .enumerate()
        .map(|(i, file)| FileOutcome {
            filename: file.name.clone(),
            status: FileStatus::Success,
            message: "Imported".to_owned(),
            snapshot_date: Some(MOCK_STATEMENT_DATE.to_owned()),
            snapshot_id: Some(format!("mock-{i}")),
            error_detail: None,
        })
        .collect();

    BatchReport {
        total_files: results.len(),
        successful: results.len(),
        duplicates: 0,
        errors: 0,
        results,
    }
}

#[async_trait::async_trait]
impl ImportProvider for MockImportProvider {
    async fn submit_batch(&self, submission: &BatchSubmission) -> Result<BatchReport> {
        let (behavior, delay) = {
            let mut state = self.lock();
            state.submissions.push(submission.clone());
            (state.behavior.clone(), state.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match behavior {
            MockBatchBehavior::EchoSuccess => Ok(echo_report(submission)),
            MockBatchBehavior::Report(report) => Ok(report),
            MockBatchBehavior::Fail { kind, message } => {
                let error = Error::new(kind);
                Err(match message {
                    Some(message) => error.with_message(message),
                    None => error,
                })
            }
            MockBatchBehavior::Hang => std::future::pending().await,
        }
    }

    async fn upload_statement(&self, file: &CandidateFile) -> Result<StatementPreview> {
        Ok(StatementPreview {
            status: "success".to_owned(),
            metadata: StatementMetadata {
                filename: file.name.clone(),
                detected_date: MOCK_STATEMENT_DATE.to_owned(),
                account_holder: "MOCK HOLDER".to_owned(),
                currency: "USD".to_owned(),
            },
            portfolio: PortfolioSummary {
                equity_value: 750.0,
                fixed_income_value: 150.0,
                cash_value: 100.0,
                total_value: 1000.0,
            },
            breakdown: Vec::new(),
        })
    }

    async fn save_snapshot(&self, request: &SaveSnapshotRequest) -> Result<SavedSnapshot> {
        let mut state = self.lock();
        state.saved.push(request.clone());

        Ok(SavedSnapshot {
            status: "success".to_owned(),
            snapshot_id: format!("snapshot-{}", state.saved.len()),
            message: "Snapshot saved".to_owned(),
            total_change: None,
            total_change_percent: None,
        })
    }

    async fn snapshot_history(&self, limit: usize) -> Result<SnapshotHistory> {
        let state = self.lock();
        let snapshots: Vec<_> = state
            .saved
            .iter()
            .enumerate()
            .rev()
            .take(limit)
            .map(|(i, request)| {
                let summary = request.snapshot_data.portfolio_summary;
                SnapshotSummary {
                    id: format!("snapshot-{}", i + 1),
                    snapshot_date: request.snapshot_data.statement_date.clone(),
                    total_value: summary.total_value,
                    equity_value: summary.equity_value,
                    fixed_income_value: summary.fixed_income_value,
                    cash_value: summary.cash_value,
                    total_change: None,
                    total_change_percent: None,
                    created_at: request.snapshot_data.statement_date.clone(),
                }
            })
            .collect();

        Ok(SnapshotHistory {
            total_count: snapshots.len(),
            snapshots,
        })
    }

    async fn snapshot_detail(&self, snapshot_id: &str) -> Result<SnapshotDetail> {
        let state = self.lock();
        let request = snapshot_id
            .strip_prefix("snapshot-")
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| state.saved.get(i))
            .ok_or_else(|| {
                Error::new(ErrorKind::NotFound).with_message("Snapshot not found")
            })?;

        let data = &request.snapshot_data;
        Ok(SnapshotDetail {
            id: snapshot_id.to_owned(),
            snapshot_date: data.statement_date.clone(),
            total_value: data.portfolio_summary.total_value,
            equity_value: data.portfolio_summary.equity_value,
            fixed_income_value: data.portfolio_summary.fixed_income_value,
            cash_value: data.portfolio_summary.cash_value,
            total_change: None,
            total_change_percent: None,
            currency: data.currency.clone(),
            account_holder: Some(data.account_holder.clone()),
            created_at: data.statement_date.clone(),
            positions: data.breakdown.clone(),
        })
    }

    async fn portfolio_stats(&self) -> Result<PortfolioStats> {
        let state = self.lock();
        let summary = state
            .saved
            .last()
            .map(|r| r.snapshot_data.portfolio_summary)
            .unwrap_or_default();
        let currency = state
            .saved
            .last()
            .map(|r| r.snapshot_data.currency.clone())
            .unwrap_or_else(|| "MXN".to_owned());

        let value = |value: f64, label: &str| FinancialValue {
            value,
            label: label.to_owned(),
            percentage_of_total: 0.0,
        };

        Ok(PortfolioStats {
            currency,
            net_worth: value(summary.total_value, "Net Worth"),
            cash: value(summary.cash_value, "Cash"),
            investments: value(summary.equity_value + summary.fixed_income_value, "Invested"),
            performance: Performance::default(),
        })
    }

    async fn holdings(&self) -> Result<Holdings> {
        let state = self.lock();
        let items: Vec<_> = state
            .saved
            .last()
            .map(|r| r.snapshot_data.breakdown.as_slice())
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, position)| Holding {
                id: (i + 1).to_string(),
                ticker: position.ticker.clone(),
                name: position.name.clone(),
                asset_type: "Stock".to_owned(),
                details: HoldingDetails {
                    quantity: position.quantity,
                    avg_cost: position.avg_cost,
                    current_price: position.current_price,
                },
                financials: HoldingFinancials {
                    total_value: position.market_value,
                    allocation: None,
                    unrealized_gain: position.unrealized_gain,
                    unrealized_gain_percent: position.unrealized_gain_percent,
                },
            })
            .collect();

        Ok(Holdings {
            count: items.len(),
            items,
        })
    }

    async fn value_history(&self) -> Result<ValueHistory> {
        let state = self.lock();
        Ok(ValueHistory {
            points: state
                .saved
                .iter()
                .map(|r| ValuePoint {
                    date: r.snapshot_data.statement_date.clone(),
                    value: r.snapshot_data.portfolio_summary.total_value,
                })
                .collect(),
        })
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        Ok(ServiceHealth::healthy())
    }
}

/// Invalidation bus that records every signal.
#[derive(Debug, Default)]
pub struct RecordingBus {
    signals: Mutex<Vec<InvalidationSignal>>,
}

impl RecordingBus {
    /// Signals published so far.
    pub fn signals(&self) -> Vec<InvalidationSignal> {
        self.signals
            .lock()
            .map(|signals| signals.clone())
            .unwrap_or_default()
    }
}

impl InvalidationBus for RecordingBus {
    fn invalidate(&self, signal: InvalidationSignal) {
        if let Ok(mut signals) = self.signals.lock() {
            signals.push(signal);
        }
    }
}

/// Notifier that records every notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Notifications raised so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|notifications| notifications.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification);
        }
    }
}
