//! Statement preview and stored snapshot types exchanged with the import service.

use serde::{Deserialize, Serialize};

/// One position parsed from a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub name: String,
    pub quantity: f64,
    pub avg_cost: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub unrealized_gain: f64,
    pub unrealized_gain_percent: f64,
}

/// Totals by asset class as printed on the statement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Equities.
    pub equity_value: f64,
    /// Fixed income.
    pub fixed_income_value: f64,
    /// Cash.
    pub cash_value: f64,
    /// Total, extracted or computed.
    pub total_value: f64,
}

/// What the parser learned about the file itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementMetadata {
    pub filename: String,
    /// Statement date, ISO `YYYY-MM-DD`.
    pub detected_date: String,
    pub account_holder: String,
    pub currency: String,
}

/// Parsed content of one uploaded statement, shown before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementPreview {
    pub status: String,
    pub metadata: StatementMetadata,
    pub portfolio: PortfolioSummary,
    #[serde(default)]
    pub breakdown: Vec<Position>,
}

/// Snapshot payload of a save request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotData {
    pub statement_date: String,
    pub account_holder: String,
    pub currency: String,
    pub metadata: SnapshotFileMetadata,
    pub portfolio_summary: PortfolioSummary,
    pub breakdown: Vec<Position>,
}

/// File metadata kept with a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFileMetadata {
    pub filename: String,
}

/// Request to persist a confirmed preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSnapshotRequest {
    pub snapshot_data: SnapshotData,
    /// SHA-256 of the original file, lowercase hex.
    pub file_hash: String,
}

impl SaveSnapshotRequest {
    /// Builds a save request from a preview and the hash of its source file.
    pub fn from_preview(preview: &StatementPreview, file_hash: impl Into<String>) -> Self {
        Self {
            snapshot_data: SnapshotData {
                statement_date: preview.metadata.detected_date.clone(),
                account_holder: preview.metadata.account_holder.clone(),
                currency: preview.metadata.currency.clone(),
                metadata: SnapshotFileMetadata {
                    filename: preview.metadata.filename.clone(),
                },
                portfolio_summary: preview.portfolio,
                breakdown: preview.breakdown.clone(),
            },
            file_hash: file_hash.into(),
        }
    }
}

/// Result of persisting a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSnapshot {
    pub status: String,
    pub snapshot_id: String,
    pub message: String,
    /// Change in total value against the previous snapshot.
    #[serde(default)]
    pub total_change: Option<f64>,
    #[serde(default)]
    pub total_change_percent: Option<f64>,
}

/// One entry of the snapshot history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: String,
    pub snapshot_date: String,
    pub total_value: f64,
    pub equity_value: f64,
    pub fixed_income_value: f64,
    pub cash_value: f64,
    #[serde(default)]
    pub total_change: Option<f64>,
    #[serde(default)]
    pub total_change_percent: Option<f64>,
    pub created_at: String,
}

/// Most recent snapshots, newest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapshotHistory {
    pub snapshots: Vec<SnapshotSummary>,
    pub total_count: usize,
}

/// A stored snapshot with all of its positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDetail {
    pub id: String,
    pub snapshot_date: String,
    pub total_value: f64,
    pub equity_value: f64,
    pub fixed_income_value: f64,
    pub cash_value: f64,
    #[serde(default)]
    pub total_change: Option<f64>,
    #[serde(default)]
    pub total_change_percent: Option<f64>,
    pub currency: String,
    #[serde(default)]
    pub account_holder: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub positions: Vec<Position>,
}
