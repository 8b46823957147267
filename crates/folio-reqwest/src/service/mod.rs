//! Import service implementation.
//!
//! This module implements the [`ImportProvider`] trait for [`ReqwestClient`].

use std::time::Instant;

use folio_core::ServiceHealth;
use folio_import::{
    BatchReport, BatchSubmission, CandidateFile, FILE_FIELD, FILES_FIELD, Holdings,
    ImportProvider, PortfolioStats, SaveSnapshotRequest, SavedSnapshot, SnapshotDetail,
    SnapshotHistory, StatementPreview, ValueHistory,
};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::connect::{ReqwestClient, TRACING_TARGET};
use crate::error::Result;

const BULK_UPLOAD_PATH: &str = "/import/bulk-upload";
const UPLOAD_PATH: &str = "/import/upload";
const SAVE_SNAPSHOT_PATH: &str = "/import/save-snapshot";
const HISTORY_PATH: &str = "/import/history";
const SNAPSHOT_PATH: &str = "/import/snapshot";
const STATS_PATH: &str = "/portfolio/dashboard/stats";
const HOLDINGS_PATH: &str = "/portfolio/transactions";
const CHART_PATH: &str = "/dashboard/chart";
const HEALTH_PATH: &str = "/health";

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
    #[serde(default)]
    database: String,
    #[serde(default)]
    environment: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

fn file_part(file: &CandidateFile) -> Result<Part> {
    Ok(Part::bytes(file.content.to_vec())
        .file_name(file.name.clone())
        .mime_str(&file.media_type)?)
}

#[async_trait::async_trait]
impl ImportProvider for ReqwestClient {
    async fn submit_batch(&self, submission: &BatchSubmission) -> folio_core::Result<BatchReport> {
        let mut form = Form::new();
        for file in &submission.files {
            form = form.part(FILES_FIELD, file_part(file)?);
        }

        tracing::debug!(
            target: TRACING_TARGET,
            submission_id = %submission.submission_id,
            files = submission.len(),
            "Uploading batch"
        );

        let mut request = self
            .request(Method::POST, BULK_UPLOAD_PATH)
            .await?
            .multipart(form);
        if let Some(timeout) = submission.timeout {
            request = request.timeout(timeout);
        }

        Ok(self.send_json(request).await?)
    }

    async fn upload_statement(&self, file: &CandidateFile) -> folio_core::Result<StatementPreview> {
        let form = Form::new().part(FILE_FIELD, file_part(file)?);
        let request = self.request(Method::POST, UPLOAD_PATH).await?.multipart(form);

        Ok(self.send_json(request).await?)
    }

    async fn save_snapshot(
        &self,
        request: &SaveSnapshotRequest,
    ) -> folio_core::Result<SavedSnapshot> {
        let http_request = self
            .request(Method::POST, SAVE_SNAPSHOT_PATH)
            .await?
            .json(request);

        Ok(self.send_json(http_request).await?)
    }

    async fn snapshot_history(&self, limit: usize) -> folio_core::Result<SnapshotHistory> {
        let request = self
            .request(Method::GET, HISTORY_PATH)
            .await?
            .query(&[("limit", limit)]);

        Ok(self.send_json(request).await?)
    }

    async fn snapshot_detail(&self, snapshot_id: &str) -> folio_core::Result<SnapshotDetail> {
        let snapshot_id = snapshot_id.trim();
        if matches!(snapshot_id, "" | "." | "..") || snapshot_id.contains(['/', '?', '#']) {
            return Err(folio_core::Error::invalid_input()
                .with_message(format!("invalid snapshot id '{snapshot_id}'")));
        }

        let request = self
            .request(Method::GET, &format!("{SNAPSHOT_PATH}/{snapshot_id}"))
            .await?;

        Ok(self.send_json(request).await?)
    }

    async fn portfolio_stats(&self) -> folio_core::Result<PortfolioStats> {
        let request = self.request(Method::GET, STATS_PATH).await?;
        Ok(self.send_json(request).await?)
    }

    async fn holdings(&self) -> folio_core::Result<Holdings> {
        let request = self.request(Method::GET, HOLDINGS_PATH).await?;
        Ok(self.send_json(request).await?)
    }

    async fn value_history(&self) -> folio_core::Result<ValueHistory> {
        let request = self.request(Method::GET, CHART_PATH).await?;
        Ok(self.send_json(request).await?)
    }

    async fn health_check(&self) -> folio_core::Result<ServiceHealth> {
        let started_at = Instant::now();
        let request = self.request(Method::GET, HEALTH_PATH).await?;
        let body: HealthBody = self.send_json(request).await?;

        let mut health = ServiceHealth::from_raw(&body.status, &body.database)
            .with_response_time(started_at.elapsed());
        if let Some(environment) = body.environment {
            health = health.with_environment(environment);
        }
        if let Some(version) = body.version {
            health = health.with_version(version);
        }
        if let Some(timestamp) = body.timestamp {
            health = health.with_reported_at(timestamp);
        }

        tracing::debug!(
            target: TRACING_TARGET,
            status = %health.status,
            database = %health.database,
            "Health check completed"
        );

        Ok(health)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use folio_core::ErrorKind;
    use folio_import::{
        BroadcastBus, BulkImportOrchestrator, CandidateSet, FileStatus, ImportError, ImportState,
        InvalidationTopic, PDF_MEDIA_TYPE, TracingNotifier,
    };
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::StaticToken;
    use crate::connect::ReqwestConfig;

    fn client(server: &MockServer) -> ReqwestClient {
        let config = ReqwestConfig::new(format!("{}/api/v1", server.uri()));
        ReqwestClient::new(config, Some(Arc::new(StaticToken::new("t0ken")))).unwrap()
    }

    fn pdf(name: &str) -> CandidateFile {
        CandidateFile::new(name, PDF_MEDIA_TYPE, format!("%PDF-1.7 {name}"))
    }

    fn submission(names: &[&str]) -> BatchSubmission {
        let set = CandidateSet::select(names.iter().map(|n| pdf(n))).unwrap();
        BatchSubmission::new(&set)
    }

    fn mixed_report() -> serde_json::Value {
        serde_json::json!({
            "total_files": 3,
            "successful": 1,
            "duplicates": 1,
            "errors": 1,
            "results": [
                {
                    "filename": "feb.pdf",
                    "status": "duplicate",
                    "message": "Statement already imported",
                    "snapshot_date": "2024-02-29",
                    "error_detail": "Uploaded on 2024-03-01"
                },
                {
                    "filename": "jan.pdf",
                    "status": "success",
                    "message": "Imported",
                    "snapshot_date": "2024-01-31",
                    "snapshot_id": "17"
                },
                {
                    "filename": "mar.pdf",
                    "status": "error",
                    "message": "Could not parse statement",
                    "error_detail": "No holdings table found"
                }
            ]
        })
    }

    #[tokio::test]
    async fn test_submit_batch_sends_one_multipart_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import/bulk-upload"))
            .and(header("authorization", "Bearer t0ken"))
            .and(body_string_contains(r#"name="files"; filename="jan.pdf""#))
            .and(body_string_contains(r#"name="files"; filename="feb.pdf""#))
            .and(body_string_contains(r#"name="files"; filename="mar.pdf""#))
            .and(body_string_contains("Content-Type: application/pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mixed_report()))
            .expect(1)
            .mount(&server)
            .await;

        let report = client(&server)
            .submit_batch(&submission(&["jan.pdf", "feb.pdf", "mar.pdf"]))
            .await
            .unwrap();

        assert!(report.validate().is_ok());
        let feb = report.outcomes_for("feb.pdf").next().unwrap();
        assert_eq!(feb.status, FileStatus::Duplicate);
        assert_eq!(feb.error_detail.as_deref(), Some("Uploaded on 2024-03-01"));
        assert_eq!(
            report.outcomes_for("jan.pdf").next().unwrap().snapshot_id.as_deref(),
            Some("17")
        );
    }

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import/bulk-upload"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "detail": "Portfolio not found. Please create one first."
            })))
            .mount(&server)
            .await;

        let error = client(&server)
            .submit_batch(&submission(&["jan.pdf"]))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(
            error.message(),
            Some("Portfolio not found. Please create one first.")
        );
    }

    #[tokio::test]
    async fn test_server_error_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import/bulk-upload"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let error = client(&server)
            .submit_batch(&submission(&["jan.pdf"]))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ExternalError);
        assert_eq!(error.message(), Some("500 Internal Server Error"));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let config = ReqwestConfig::new("http://127.0.0.1:9/api/v1");
        let client = ReqwestClient::new(config, None).unwrap();

        let error = client
            .submit_batch(&submission(&["jan.pdf"]))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NetworkError);
    }

    #[tokio::test]
    async fn test_upload_statement_uses_single_file_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import/upload"))
            .and(body_string_contains(r#"name="file"; filename="jan.pdf""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "metadata": {
                    "filename": "jan.pdf",
                    "detected_date": "2024-01-31",
                    "account_holder": "JANE DOE",
                    "currency": "MXN"
                },
                "portfolio": {
                    "equity_value": 10.0,
                    "fixed_income_value": 0.0,
                    "cash_value": 5.0,
                    "total_value": 15.0
                },
                "breakdown": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let preview = client(&server).upload_statement(&pdf("jan.pdf")).await.unwrap();
        assert_eq!(preview.metadata.detected_date, "2024-01-31");
        assert_eq!(preview.portfolio.total_value, 15.0);
    }

    #[tokio::test]
    async fn test_save_snapshot_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import/save-snapshot"))
            .and(body_string_contains(r#""file_hash":"abc123""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "snapshot_id": "99",
                "message": "Snapshot saved",
                "total_change": 12.5,
                "total_change_percent": 1.2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let preview: StatementPreview = serde_json::from_value(serde_json::json!({
            "status": "success",
            "metadata": {
                "filename": "jan.pdf",
                "detected_date": "2024-01-31",
                "account_holder": "JANE DOE",
                "currency": "MXN"
            },
            "portfolio": {
                "equity_value": 0.0,
                "fixed_income_value": 0.0,
                "cash_value": 0.0,
                "total_value": 0.0
            }
        }))
        .unwrap();

        let saved = client(&server)
            .save_snapshot(&SaveSnapshotRequest::from_preview(&preview, "abc123"))
            .await
            .unwrap();
        assert_eq!(saved.snapshot_id, "99");
        assert_eq!(saved.total_change, Some(12.5));
    }

    #[tokio::test]
    async fn test_snapshot_history_passes_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/import/history"))
            .and(query_param("limit", "12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "snapshots": [{
                    "id": "1",
                    "snapshot_date": "2024-01-31",
                    "total_value": 100.0,
                    "equity_value": 60.0,
                    "fixed_income_value": 30.0,
                    "cash_value": 10.0,
                    "total_change": null,
                    "total_change_percent": null,
                    "created_at": "2024-02-01T10:00:00"
                }],
                "total_count": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let history = client(&server).snapshot_history(12).await.unwrap();
        assert_eq!(history.total_count, 1);
        assert_eq!(history.snapshots[0].snapshot_date, "2024-01-31");
    }

    #[tokio::test]
    async fn test_snapshot_detail_rejects_path_like_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server);
        for id in ["../users", "..", ".", " ", "a?b", "a#b"] {
            let error = client.snapshot_detail(id).await.unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidInput, "id {id:?}");
        }
    }

    #[tokio::test]
    async fn test_batch_upload_uses_submission_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import/bulk-upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(mixed_report())
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = ReqwestConfig::new(format!("{}/api/v1", server.uri())).with_timeout(1);
        let client = ReqwestClient::new(config, None).unwrap();

        let report = client
            .submit_batch(
                &submission(&["jan.pdf", "feb.pdf", "mar.pdf"]).with_timeout(Duration::from_secs(10)),
            )
            .await
            .unwrap();
        assert_eq!(report.total_files, 3);
    }

    #[tokio::test]
    async fn test_batch_upload_times_out_at_submission_bound() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import/bulk-upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(mixed_report())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let error = client(&server)
            .submit_batch(&submission(&["jan.pdf"]).with_timeout(Duration::from_millis(300)))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Timeout);
        assert_eq!(error.message(), Some("Request timed out"));
    }

    #[tokio::test]
    async fn test_portfolio_stats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/portfolio/dashboard/stats"))
            .and(header("authorization", "Bearer t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "currency": "MXN",
                "netWorth": { "value": 2000.0, "label": "Valor Total", "percentageOfTotal": 0.0 },
                "cash": { "value": 200.0, "label": "Efectivo", "percentageOfTotal": 0.0 },
                "investments": { "value": 1800.0, "label": "Invertido", "percentageOfTotal": 0.0 },
                "performance": { "dailyChange": -15.5, "dailyChangePercentage": -0.77, "trend": "down" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stats = client(&server).portfolio_stats().await.unwrap();
        assert_eq!(stats.net_worth.value, 2000.0);
        assert_eq!(stats.investments.label, "Invertido");
        assert_eq!(stats.performance.trend, folio_import::Trend::Down);
    }

    #[tokio::test]
    async fn test_holdings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/portfolio/transactions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "items": [{
                    "id": "3",
                    "ticker": "VOO",
                    "name": "Vanguard S&P 500",
                    "type": "ETF",
                    "details": { "quantity": 2.0, "avgCost": 700.0, "currentPrice": 750.0 },
                    "financials": {
                        "totalValue": 1500.0,
                        "unrealizedGain": 100.0,
                        "unrealizedGainPercent": 7.14
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let holdings = client(&server).holdings().await.unwrap();
        assert_eq!(holdings.count, 1);
        assert_eq!(holdings.items[0].asset_type, "ETF");
        assert_eq!(holdings.items[0].details.avg_cost, 700.0);
    }

    #[tokio::test]
    async fn test_value_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/dashboard/chart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "points": [
                    { "date": "2024-01-31", "value": 1800.0 },
                    { "date": "2024-02-29", "value": 2000.0 }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let history = client(&server).value_history().await.unwrap();
        assert_eq!(history.points.len(), 2);
        assert_eq!(history.latest().map(|p| p.date.as_str()), Some("2024-02-29"));
    }

    #[tokio::test]
    async fn test_stats_without_token_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/portfolio/dashboard/stats"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "detail": "Not authenticated"
            })))
            .mount(&server)
            .await;

        let config = ReqwestConfig::new(format!("{}/api/v1", server.uri()));
        let error = ReqwestClient::new(config, None)
            .unwrap()
            .portfolio_stats()
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Authentication);
        assert_eq!(error.message(), Some("Not authenticated"));
    }

    #[tokio::test]
    async fn test_health_check_reports_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "healthy",
                "environment": "development",
                "timestamp": "2024-01-01T00:00:00",
                "database": "connected",
                "version": "1.0.0"
            })))
            .mount(&server)
            .await;

        let health = client(&server).health_check().await.unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.database, folio_core::DatabaseStatus::Connected);
        assert_eq!(health.environment.as_deref(), Some("development"));
        assert_eq!(health.reported_at.as_deref(), Some("2024-01-01T00:00:00"));
        assert!(health.response.is_some());
    }

    #[tokio::test]
    async fn test_health_check_database_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "unhealthy",
                "environment": "production",
                "timestamp": "2024-01-01T00:00:00",
                "database": "error",
                "version": "1.0.0"
            })))
            .mount(&server)
            .await;

        let health = client(&server).health_check().await.unwrap();
        assert!(!health.is_healthy());
        assert_eq!(health.problem().as_deref(), Some("database error"));
    }

    #[tokio::test]
    async fn test_orchestrated_batch_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import/bulk-upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mixed_report()))
            .expect(1)
            .mount(&server)
            .await;

        let bus = Arc::new(BroadcastBus::default());
        let mut signals = bus.subscribe();
        let mut orchestrator = BulkImportOrchestrator::new(
            client(&server).into_service(),
            bus.clone(),
            Arc::new(TracingNotifier),
        );

        orchestrator
            .select_files([
                pdf("jan.pdf"),
                CandidateFile::new("notes.txt", "text/plain", "x"),
                pdf("feb.pdf"),
                pdf("mar.pdf"),
            ])
            .unwrap();
        assert_eq!(orchestrator.candidates().len(), 3);

        let report = orchestrator.submit_batch().await.unwrap();
        assert_eq!(report.successful, 1);
        assert_eq!(orchestrator.state(), ImportState::Reported);

        let signal = signals.recv().await.unwrap();
        assert!(signal.contains(InvalidationTopic::SnapshotHistory));
        assert!(signals.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_orchestrated_failure_keeps_selection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import/bulk-upload"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "detail": "Maximum 100 files per batch"
            })))
            .mount(&server)
            .await;

        let mut orchestrator = BulkImportOrchestrator::new(
            client(&server).into_service(),
            Arc::new(BroadcastBus::default()),
            Arc::new(TracingNotifier),
        );
        orchestrator.select_files([pdf("jan.pdf")]).unwrap();

        let error = orchestrator.submit_batch().await.unwrap_err();
        assert!(matches!(error, ImportError::BatchSubmissionFailed { .. }));
        assert_eq!(error.user_message(), "Maximum 100 files per batch");
        assert_eq!(orchestrator.candidates().len(), 1);
    }
}
