//! Dashboard read models refetched after an import invalidates them.
//!
//! The service serializes these with camelCase keys.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Direction of the latest change in total value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Neutral,
}

/// A labelled amount on the stats panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialValue {
    pub value: f64,
    pub label: String,
    /// Share of net worth, in percent. Zero when the service omits it.
    #[serde(default)]
    pub percentage_of_total: f64,
}

/// Change since the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    #[serde(default)]
    pub daily_change: f64,
    #[serde(default)]
    pub daily_change_percentage: f64,
    #[serde(default)]
    pub trend: Trend,
}

/// Headline figures of the latest snapshot.
///
/// All values are zero until the first statement is imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub currency: String,
    pub net_worth: FinancialValue,
    pub cash: FinancialValue,
    pub investments: FinancialValue,
    pub performance: Performance,
}

/// Quantity and prices of one holding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingDetails {
    pub quantity: f64,
    pub avg_cost: f64,
    pub current_price: f64,
}

/// Valuation of one holding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingFinancials {
    pub total_value: f64,
    /// Share of the portfolio, in percent, when the service computes it.
    #[serde(default)]
    pub allocation: Option<f64>,
    pub unrealized_gain: f64,
    pub unrealized_gain_percent: f64,
}

/// One position of the latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: String,
    pub ticker: String,
    pub name: String,
    /// `Stock`, `ETF`, `Bond` or `Cash`.
    #[serde(rename = "type")]
    pub asset_type: String,
    pub details: HoldingDetails,
    pub financials: HoldingFinancials,
}

/// Positions of the latest snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Holdings {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub items: Vec<Holding>,
}

impl Holdings {
    /// Sum of the market value of every holding.
    pub fn total_value(&self) -> f64 {
        self.items.iter().map(|h| h.financials.total_value).sum()
    }
}

/// One point of the total-value chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    pub value: f64,
}

/// Total portfolio value over time, oldest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueHistory {
    #[serde(default)]
    pub points: Vec<ValuePoint>,
}

impl ValueHistory {
    /// Most recent point, if any.
    pub fn latest(&self) -> Option<&ValuePoint> {
        self.points.last()
    }
}
