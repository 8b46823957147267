#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod commands;
mod config;
mod telemetry;

use std::process;

use anyhow::Context;
use folio_core::ErrorKind;

use crate::commands::App;
use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "folio_cli::startup";
pub const TRACING_TARGET_CONFIG: &str = "folio_cli::config";
pub const TRACING_TARGET_COMMAND: &str = "folio_cli::command";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_STARTUP,
            error = %error,
            "command failed"
        );
    }
    eprintln!("Error: {error:#}");

    process::exit(exit_code(&error));
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    log_startup_info();
    cli.log();

    cli.validate().context("invalid configuration")?;

    let app = App::from_cli(&cli)?;
    app.run(&cli.command).await
}

/// Logs build information at debug level.
fn log_startup_info() {
    tracing::debug!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        arch = std::env::consts::ARCH,
        os = std::env::consts::OS,
        features = ?enabled_features(),
        "Build information"
    );
}

/// Maps the first service error in the chain to a sysexits-style code.
///
/// Anything that did not come from the service exits with 1.
fn exit_code(error: &anyhow::Error) -> i32 {
    let kind = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<folio_core::Error>())
        .map(folio_core::Error::kind);

    match kind {
        Some(ErrorKind::InvalidInput | ErrorKind::Serialization) => 65,
        Some(
            ErrorKind::NetworkError
            | ErrorKind::Timeout
            | ErrorKind::ServiceUnavailable
            | ErrorKind::RateLimited,
        ) => 69,
        Some(ErrorKind::Authentication | ErrorKind::Authorization) => 77,
        Some(ErrorKind::Configuration) => 78,
        _ => 1,
    }
}

/// Returns a list of enabled compile-time features.
fn enabled_features() -> Vec<&'static str> {
    [cfg!(feature = "dotenv").then_some("dotenv")]
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use folio_import::ImportError;

    use super::*;

    #[test]
    fn test_exit_code_follows_service_error_kind() {
        let unauthorized = anyhow::Error::new(
            folio_core::Error::from_status(401).with_message("Not authenticated"),
        )
        .context("failed to fetch portfolio stats");
        assert_eq!(exit_code(&unauthorized), 77);

        let timed_out = anyhow::Error::new(ImportError::BatchSubmissionFailed {
            message: "Request timed out".to_owned(),
            source: Some(folio_core::Error::timeout()),
        });
        assert_eq!(exit_code(&timed_out), 69);
    }

    #[test]
    fn test_exit_code_defaults_to_one() {
        assert_eq!(exit_code(&anyhow::anyhow!("import cancelled")), 1);
        let selection = anyhow::Error::new(ImportError::invalid_selection("no files selected"));
        assert_eq!(exit_code(&selection), 1);
    }
}
