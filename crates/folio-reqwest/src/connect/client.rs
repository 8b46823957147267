//! Reqwest-based client for the import API.

use std::sync::Arc;

use folio_import::ImportService;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::{ApiTransport, ReqwestConfig};
use crate::auth::TokenProvider;
use crate::error::{Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "folio_reqwest::client";

/// Inner client that holds the transport and configuration.
struct ReqwestClientInner {
    transport: ApiTransport,
    config: ReqwestConfig,
}

/// Reqwest-based HTTP client for the import API.
///
/// This client implements the [`ImportProvider`](folio_import::ImportProvider)
/// trait on top of an [`ApiTransport`].
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use folio_reqwest::{ReqwestClient, ReqwestConfig, StaticToken};
///
/// let config = ReqwestConfig::new("https://folio.example.com/api/v1");
/// let client = ReqwestClient::new(config, Some(Arc::new(StaticToken::new(token))))?;
///
/// let service = client.into_service();
/// let history = service.snapshot_history(12).await?;
/// ```
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .field("transport", &self.inner.transport)
            .finish()
    }
}

impl ReqwestClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: ReqwestConfig, tokens: Option<Arc<dyn TokenProvider>>) -> Result<Self> {
        tracing::debug!(
            target: TRACING_TARGET,
            api_url = %config.api_url,
            timeout_ms = config.effective_timeout().as_millis(),
            authenticated = tokens.is_some(),
            "Creating reqwest client"
        );

        let transport = ApiTransport::new(&config, tokens)?;
        let inner = ReqwestClientInner { transport, config };

        tracing::info!(
            target: TRACING_TARGET,
            base_url = %inner.transport.base_url(),
            "Reqwest client created successfully"
        );

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Gets the underlying transport.
    pub fn transport(&self) -> &ApiTransport {
        &self.inner.transport
    }

    /// Converts this client into an [`ImportService`] for use with dependency injection.
    pub fn into_service(self) -> ImportService {
        ImportService::new(self)
    }

    /// Starts an authenticated request.
    pub(crate) async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        self.inner.transport.request(method, path).await
    }

    /// Sends `request` and decodes a JSON success body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await?;
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Turns a non-success response into [`Error::Api`].
    pub(crate) async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| status.to_string());

        tracing::debug!(
            target: TRACING_TARGET,
            status = status.as_u16(),
            message = %message,
            "API returned an error"
        );

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Extracts the human-readable message of an error body.
///
/// Prefers a string `detail`, then a string `message`. Validation errors
/// (`detail` as a list) are joined by their `msg` fields.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    match value.get("detail") {
        Some(serde_json::Value::String(detail)) if !detail.trim().is_empty() => {
            return Some(detail.clone());
        }
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        }
        _ => {}
    }

    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail": "Only PDF files are allowed", "message": "x"}"#).as_deref(),
            Some("Only PDF files are allowed")
        );
        assert_eq!(
            error_message(r#"{"message": "Service down"}"#).as_deref(),
            Some("Service down")
        );
    }

    #[test]
    fn test_error_message_joins_validation_errors() {
        let body = r#"{"detail": [{"loc": ["body", "files"], "msg": "field required"}]}"#;
        assert_eq!(error_message(body).as_deref(), Some("field required"));
    }

    #[test]
    fn test_error_message_ignores_non_json() {
        assert!(error_message("<html>Bad Gateway</html>").is_none());
        assert!(error_message(r#"{"detail": ""}"#).is_none());
    }

    #[test]
    fn test_client_creation() {
        let client = ReqwestClient::new(ReqwestConfig::default(), None).unwrap();
        assert!(client.config().user_agent.is_none());
        assert!(!client.transport().is_authenticated());
    }

    #[test]
    fn test_client_rejects_bad_url() {
        assert!(ReqwestClient::new(ReqwestConfig::new("::"), None).is_err());
    }
}
