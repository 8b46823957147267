//! Terminal rendering of notifications, reports and snapshots.

use std::fmt::Write as _;

use folio_import::{
    BatchReport, FileStatus, Holdings, Notification, NotificationLevel, Notifier, PortfolioStats,
    SavedSnapshot, SnapshotDetail, SnapshotHistory, StatementPreview, ValueHistory,
};

/// Notifier printing to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("{}", render_notification(&notification));
    }
}

pub fn render_notification(notification: &Notification) -> String {
    let marker = match notification.level {
        NotificationLevel::Success => "[ok]",
        NotificationLevel::Info => "[info]",
        NotificationLevel::Error => "[error]",
    };
    format!("{marker} {notification}")
}

/// One line per submitted file, errors last.
pub fn render_report(report: &BatchReport) -> String {
    let mut results: Vec<_> = report.results.iter().collect();
    results.sort_by(|a, b| {
        let a_key = (a.status == FileStatus::Error, &a.filename);
        let b_key = (b.status == FileStatus::Error, &b.filename);
        a_key.cmp(&b_key)
    });

    let width = results
        .iter()
        .map(|outcome| outcome.filename.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for outcome in results {
        let date = outcome.snapshot_date.as_deref().unwrap_or("-");
        let _ = write!(
            out,
            "{:<width$}  {:<9}  {:<10}  {}",
            outcome.filename,
            outcome.status.as_ref(),
            date,
            outcome.message,
        );
        if let Some(detail) = &outcome.error_detail {
            let _ = write!(out, " ({detail})");
        }
        out.push('\n');
    }

    let _ = write!(
        out,
        "{} files: {} imported, {} duplicates, {} errors",
        report.total_files, report.successful, report.duplicates, report.errors
    );
    out
}

pub fn render_preview(preview: &StatementPreview) -> String {
    let meta = &preview.metadata;
    let totals = &preview.portfolio;

    let mut out = format!(
        "{} ({})\nstatement date: {}\naccount holder: {}\n\
         equity: {:.2}  fixed income: {:.2}  cash: {:.2}  total: {:.2} {}\n",
        meta.filename,
        preview.status,
        meta.detected_date,
        meta.account_holder,
        totals.equity_value,
        totals.fixed_income_value,
        totals.cash_value,
        totals.total_value,
        meta.currency,
    );

    for position in &preview.breakdown {
        let _ = writeln!(
            out,
            "  {:<8} {:>12.4} @ {:>10.2} = {:>12.2}",
            position.ticker, position.quantity, position.current_price, position.market_value
        );
    }
    out
}

pub fn render_saved(saved: &SavedSnapshot) -> String {
    let mut out = format!("{} (snapshot {})", saved.message, saved.snapshot_id);
    if let (Some(change), Some(percent)) = (saved.total_change, saved.total_change_percent) {
        let _ = write!(out, "\nchange since previous: {change:+.2} ({percent:+.2}%)");
    }
    out
}

pub fn render_history(history: &SnapshotHistory) -> String {
    let mut out = String::new();
    for snapshot in &history.snapshots {
        let change = snapshot
            .total_change_percent
            .map(|p| format!("{p:+.2}%"))
            .unwrap_or_else(|| "-".to_owned());
        let _ = writeln!(
            out,
            "{:<8} {}  {:>14.2}  {:>8}",
            snapshot.id, snapshot.snapshot_date, snapshot.total_value, change
        );
    }
    let _ = write!(
        out,
        "{} of {} snapshots",
        history.snapshots.len(),
        history.total_count
    );
    out
}

pub fn render_detail(detail: &SnapshotDetail) -> String {
    let mut out = format!(
        "snapshot {} ({})\ntotal: {:.2} {}  equity: {:.2}  fixed income: {:.2}  cash: {:.2}\n",
        detail.id,
        detail.snapshot_date,
        detail.total_value,
        detail.currency,
        detail.equity_value,
        detail.fixed_income_value,
        detail.cash_value,
    );
    for position in &detail.positions {
        let _ = writeln!(
            out,
            "  {:<8} {:<30} {:>12.2} {:>+8.2}%",
            position.ticker, position.name, position.market_value, position.unrealized_gain_percent
        );
    }
    out
}

pub fn render_stats(stats: &PortfolioStats) -> String {
    let performance = &stats.performance;
    let mut out = String::new();
    for value in [&stats.net_worth, &stats.cash, &stats.investments] {
        let _ = writeln!(out, "{:<12} {:>14.2} {}", value.label, value.value, stats.currency);
    }
    let _ = write!(
        out,
        "{:<12} {:>+14.2} ({:+.2}%, {})",
        "change", performance.daily_change, performance.daily_change_percentage, performance.trend
    );
    out
}

pub fn render_holdings(holdings: &Holdings) -> String {
    let mut out = String::new();
    for holding in &holdings.items {
        let _ = writeln!(
            out,
            "{:<8} {:<5} {:>12.4} @ {:>10.2} = {:>12.2} {:>+8.2}%",
            holding.ticker,
            holding.asset_type,
            holding.details.quantity,
            holding.details.current_price,
            holding.financials.total_value,
            holding.financials.unrealized_gain_percent,
        );
    }
    let _ = write!(
        out,
        "{} holdings, {:.2} total",
        holdings.items.len(),
        holdings.total_value()
    );
    out
}

pub fn render_value_history(history: &ValueHistory) -> String {
    if history.points.is_empty() {
        return "no snapshots yet".to_owned();
    }

    let mut out = String::new();
    for point in &history.points {
        let _ = writeln!(out, "{}  {:>14.2}", point.date, point.value);
    }
    out.pop();
    out
}
