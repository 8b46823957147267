//! Command handlers.

mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use folio_import::{
    BroadcastBus, BulkImportOrchestrator, CandidateFile, ImportService, StatementImport,
};
use folio_reqwest::ReqwestClient;
pub use output::ConsoleNotifier;

use crate::TRACING_TARGET_COMMAND;
use crate::config::{Cli, Command, ImportConfig};

/// Everything a command needs, built once from the parsed CLI.
#[derive(Debug, Clone)]
pub struct App {
    service: ImportService,
    import: ImportConfig,
}

impl App {
    /// Builds the transport and service from configuration.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let client = ReqwestClient::new(cli.http.clone(), cli.auth.token_provider())
            .context("failed to create HTTP client")?;

        Ok(Self {
            service: client.into_service(),
            import: cli.import.clone(),
        })
    }

    /// Runs `command`.
    pub async fn run(&self, command: &Command) -> anyhow::Result<()> {
        tracing::debug!(
            target: TRACING_TARGET_COMMAND,
            command = command.name(),
            "Running command"
        );

        match command {
            Command::Import { paths } => self.import(paths).await,
            Command::Preview { path } => self.preview(path).await,
            Command::Confirm { path } => self.confirm(path).await,
            Command::History { limit, json } => self.history(*limit, *json).await,
            Command::Snapshot { id, json } => self.snapshot(id, *json).await,
            Command::Stats { json } => self.stats(*json).await,
            Command::Holdings { json } => self.holdings(*json).await,
            Command::Chart { json } => self.chart(*json).await,
            Command::Health => self.health().await,
        }
    }

    async fn import(&self, paths: &[PathBuf]) -> anyhow::Result<()> {
        let candidates = collect_candidates(paths).await?;

        let bus = Arc::new(BroadcastBus::default());
        let mut signals = bus.subscribe();
        let mut orchestrator =
            BulkImportOrchestrator::new(self.service.clone(), bus, Arc::new(ConsoleNotifier))
                .with_config(self.import.orchestrator());

        let selection = orchestrator.select_files(candidates)?;
        eprintln!(
            "Submitting {} statements ({} bytes)...",
            selection.len(),
            selection.total_size()
        );

        let report = tokio::select! {
            result = orchestrator.submit_batch() => result?,
            _ = tokio::signal::ctrl_c() => bail!("import cancelled"),
        };

        println!("{}", output::render_report(report));

        while let Ok(signal) = signals.try_recv() {
            tracing::info!(
                target: TRACING_TARGET_COMMAND,
                topics = %signal,
                "Dashboard views invalidated"
            );
        }

        Ok(())
    }

    async fn preview(&self, path: &Path) -> anyhow::Result<()> {
        let file = read_statement(path).await?;
        let flow = StatementImport::new(self.service.clone(), Arc::new(BroadcastBus::default()));

        let preview = flow.preview(&file).await?;
        println!("{}", output::render_preview(&preview));
        Ok(())
    }

    async fn confirm(&self, path: &Path) -> anyhow::Result<()> {
        let file = read_statement(path).await?;
        let flow = StatementImport::new(self.service.clone(), Arc::new(BroadcastBus::default()));

        let preview = flow.preview(&file).await?;
        let saved = flow.confirm(&file, &preview).await?;
        println!("{}", output::render_saved(&saved));
        Ok(())
    }

    async fn history(&self, limit: usize, json: bool) -> anyhow::Result<()> {
        let history = self
            .service
            .snapshot_history(limit)
            .await
            .context("failed to fetch snapshot history")?;

        if json {
            println!("{}", serde_json::to_string_pretty(&history)?);
        } else {
            println!("{}", output::render_history(&history));
        }
        Ok(())
    }

    async fn snapshot(&self, id: &str, json: bool) -> anyhow::Result<()> {
        let detail = self
            .service
            .snapshot_detail(id)
            .await
            .with_context(|| format!("failed to fetch snapshot {id}"))?;

        if json {
            println!("{}", serde_json::to_string_pretty(&detail)?);
        } else {
            println!("{}", output::render_detail(&detail));
        }
        Ok(())
    }

    async fn stats(&self, json: bool) -> anyhow::Result<()> {
        let stats = self
            .service
            .portfolio_stats()
            .await
            .context("failed to fetch portfolio stats")?;

        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("{}", output::render_stats(&stats));
        }
        Ok(())
    }

    async fn holdings(&self, json: bool) -> anyhow::Result<()> {
        let holdings = self
            .service
            .holdings()
            .await
            .context("failed to fetch holdings")?;

        if json {
            println!("{}", serde_json::to_string_pretty(&holdings)?);
        } else {
            println!("{}", output::render_holdings(&holdings));
        }
        Ok(())
    }

    async fn chart(&self, json: bool) -> anyhow::Result<()> {
        let history = self
            .service
            .value_history()
            .await
            .context("failed to fetch value history")?;

        if json {
            println!("{}", serde_json::to_string_pretty(&history)?);
        } else {
            println!("{}", output::render_value_history(&history));
        }
        Ok(())
    }

    async fn health(&self) -> anyhow::Result<()> {
        let health = self
            .service
            .health_check()
            .await
            .context("health check failed")?;

        println!("{}", serde_json::to_string_pretty(&health)?);
        if !health.is_healthy() {
            bail!(
                "service is not healthy: {}",
                health.problem().unwrap_or_default()
            );
        }
        Ok(())
    }
}

async fn read_statement(path: &Path) -> anyhow::Result<CandidateFile> {
    CandidateFile::from_path(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Reads every given file, expanding directories one level deep.
///
/// Directory entries are read in name order; subdirectories are ignored.
async fn collect_candidates(paths: &[PathBuf]) -> anyhow::Result<Vec<CandidateFile>> {
    let mut files = Vec::new();

    for path in paths {
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("failed to access {}", path.display()))?;

        if !metadata.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut entries = tokio::fs::read_dir(path)
            .await
            .with_context(|| format!("failed to list {}", path.display()))?;
        let mut listed = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                listed.push(entry.path());
            }
        }
        listed.sort();
        files.extend(listed);
    }

    let mut candidates = Vec::with_capacity(files.len());
    for path in &files {
        candidates.push(read_statement(path).await?);
    }

    tracing::debug!(
        target: TRACING_TARGET_COMMAND,
        paths = paths.len(),
        files = candidates.len(),
        "Collected candidate files"
    );

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use folio_import::CandidateSet;

    use super::*;

    #[tokio::test]
    async fn test_collect_expands_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF-1.7").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-1.7").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.pdf"), b"%PDF-1.7").unwrap();

        let extra = dir.path().join("nested").join("c.pdf");
        let candidates = collect_candidates(&[dir.path().to_path_buf(), extra])
            .await
            .unwrap();

        let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a.pdf", "b.pdf", "notes.txt", "c.pdf"]);

        let selection = CandidateSet::select(candidates).unwrap();
        assert_eq!(selection.len(), 3);
    }

    #[tokio::test]
    async fn test_collect_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(
            collect_candidates(&[dir.path().join("missing.pdf")])
                .await
                .is_err()
        );
    }
}
