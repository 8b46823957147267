//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── http: ReqwestConfig     # API URL, HTTP timeout, user agent
//! ├── auth: AuthConfig        # Static token or client credentials
//! ├── import: ImportConfig    # Batch submission timeout
//! └── command: Command        # What to do
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

mod auth;
mod import;

use std::path::PathBuf;

use anyhow::Context;
pub use auth::AuthConfig;
use clap::{Parser, Subcommand};
use folio_reqwest::ReqwestConfig;
pub use import::ImportConfig;

use crate::TRACING_TARGET_CONFIG;

/// Default number of entries listed by `history`.
pub const DEFAULT_HISTORY_LIMIT: usize = 12;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "folio")]
#[command(about = "Import brokerage statements into the folio dashboard")]
#[command(version)]
pub struct Cli {
    /// HTTP client configuration.
    #[clap(flatten)]
    pub http: ReqwestConfig,

    /// API authentication.
    #[clap(flatten)]
    pub auth: AuthConfig,

    /// Batch import settings.
    #[clap(flatten)]
    pub import: ImportConfig,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Import up to 100 PDF statements in one batch
    ///
    /// Directories are expanded to the files they directly contain.
    /// Files that are not PDFs are skipped.
    Import {
        /// Files or directories to import
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Parse one statement and show what would be stored
    Preview {
        /// Statement PDF
        path: PathBuf,
    },

    /// Parse one statement and store it
    Confirm {
        /// Statement PDF
        path: PathBuf,
    },

    /// List the most recent snapshots
    History {
        /// Number of snapshots to list
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one snapshot with its positions
    Snapshot {
        /// Snapshot identifier
        id: String,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Show net worth, cash, investments and the latest change
    Stats {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// List the positions of the latest snapshot
    Holdings {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Show total portfolio value over time
    Chart {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the import API is reachable and healthy
    Health,
}

impl Command {
    /// Short name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Import { .. } => "import",
            Self::Preview { .. } => "preview",
            Self::Confirm { .. } => "confirm",
            Self::History { .. } => "history",
            Self::Snapshot { .. } => "snapshot",
            Self::Stats { .. } => "stats",
            Self::Holdings { .. } => "holdings",
            Self::Chart { .. } => "chart",
            Self::Health => "health",
        }
    }
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.http
            .base_url()
            .context("invalid HTTP configuration")?;
        self.auth
            .validate()
            .context("invalid authentication configuration")?;
        self.import
            .validate()
            .context("invalid import configuration")?;

        if let Command::History { limit: 0, .. } = self.command {
            anyhow::bail!("--limit must be at least 1");
        }

        Ok(())
    }

    /// Logs configuration at debug level (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            command = self.command.name(),
            api_url = %self.http.api_url,
            http_timeout_secs = self.http.effective_timeout().as_secs(),
            user_agent = %self.http.effective_user_agent(),
            auth = self.auth.method(),
            submit_timeout_secs = self.import.submit_timeout,
            "Configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import() {
        let cli = Cli::try_parse_from([
            "folio",
            "--api-url",
            "https://folio.example.com/api/v1",
            "--api-token",
            "abc",
            "import",
            "jan.pdf",
            "statements/",
        ])
        .unwrap();

        assert_eq!(cli.http.api_url, "https://folio.example.com/api/v1");
        assert_eq!(cli.import.submit_timeout, 120);
        match &cli.command {
            Command::Import { paths } => assert_eq!(paths.len(), 2),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_import_requires_paths() {
        assert!(Cli::try_parse_from(["folio", "import"]).is_err());
    }

    #[test]
    fn test_history_default_limit() {
        let cli = Cli::try_parse_from(["folio", "history"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::History {
                limit: DEFAULT_HISTORY_LIMIT,
                json: false
            }
        ));
    }

    #[test]
    fn test_parse_dashboard_commands() {
        let cli = Cli::try_parse_from(["folio", "holdings", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Holdings { json: true }));
        assert_eq!(cli.command.name(), "holdings");

        let cli = Cli::try_parse_from(["folio", "stats"]).unwrap();
        assert!(matches!(cli.command, Command::Stats { json: false }));

        let cli = Cli::try_parse_from(["folio", "chart"]).unwrap();
        assert_eq!(cli.command.name(), "chart");
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let cli = Cli::try_parse_from(["folio", "history", "--limit", "0"]).unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let cli = Cli::try_parse_from(["folio", "--api-url", "nope", "health"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
