//! Import orchestration configuration.

use std::time::Duration;

use clap::Args;
use folio_import::{DEFAULT_SUBMIT_TIMEOUT, OrchestratorConfig};
use serde::{Deserialize, Serialize};

/// Settings for batch submissions.
#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct ImportConfig {
    /// Upper bound in seconds for one batch submission, server processing included
    #[arg(
        long = "submit-timeout",
        env = "SUBMIT_TIMEOUT",
        default_value_t = DEFAULT_SUBMIT_TIMEOUT.as_secs()
    )]
    pub submit_timeout: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT.as_secs(),
        }
    }
}

impl ImportConfig {
    /// Builds the orchestrator configuration.
    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig::default().with_submit_timeout(Duration::from_secs(self.submit_timeout))
    }

    /// Validates configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.submit_timeout == 0 {
            anyhow::bail!("--submit-timeout must be at least 1 second");
        }
        Ok(())
    }
}
