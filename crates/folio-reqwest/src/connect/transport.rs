//! Configured HTTP transport with bearer authentication.

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder};
use secrecy::ExposeSecret;
use url::Url;

use super::{ReqwestConfig, TRACING_TARGET};
use crate::auth::TokenProvider;
use crate::error::{Error, Result};

/// HTTP transport shared by every API call.
///
/// Built once from a [`ReqwestConfig`] and an optional [`TokenProvider`].
/// When the provider fails, requests go out unauthenticated and the API
/// decides whether that is acceptable.
#[derive(Clone)]
pub struct ApiTransport {
    http: Client,
    base_url: Url,
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl std::fmt::Debug for ApiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTransport")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.tokens.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiTransport {
    /// Creates a transport from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &ReqwestConfig, tokens: Option<Arc<dyn TokenProvider>>) -> Result<Self> {
        let base_url = config.base_url()?;
        let http = Client::builder()
            .timeout(config.effective_timeout())
            .user_agent(config.effective_user_agent())
            .build()?;

        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Base URL every path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns whether a token provider is configured.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_some()
    }

    /// Resolves an API path such as `/import/history` against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `path` cannot be joined.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("invalid api path '{path}': {e}")))
    }

    /// Starts a request for `path` and attaches credentials.
    pub async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        Ok(self.prepare_request(self.http.request(method, url)).await)
    }

    /// Attaches `Authorization: Bearer` from the token provider, if any.
    pub async fn prepare_request(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(tokens) = &self.tokens else {
            return request;
        };

        match tokens.access_token().await {
            Ok(token) => request.bearer_auth(token.expose_secret()),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Failed to obtain access token, sending request unauthenticated"
                );
                request
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::StaticToken;

    struct FailingTokens;

    #[async_trait::async_trait]
    impl TokenProvider for FailingTokens {
        async fn access_token(&self) -> Result<SecretString> {
            Err(Error::Token("identity provider unreachable".into()))
        }
    }

    fn config(server: &MockServer) -> ReqwestConfig {
        ReqwestConfig::new(format!("{}/api/v1", server.uri()))
    }

    #[test]
    fn test_url_joins_under_base() {
        let transport = ApiTransport::new(&ReqwestConfig::default(), None).unwrap();
        assert_eq!(
            transport.url("/import/snapshot/42").unwrap().as_str(),
            "http://localhost:8000/api/v1/import/snapshot/42"
        );
        assert_eq!(
            transport.url("health").unwrap().as_str(),
            "http://localhost:8000/api/v1/health"
        );
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport =
            ApiTransport::new(&config(&server), Some(Arc::new(StaticToken::new("abc")))).unwrap();
        let response = transport
            .request(Method::GET, "/health")
            .await
            .unwrap()
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_token_failure_sends_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transport = ApiTransport::new(&config(&server), Some(Arc::new(FailingTokens))).unwrap();
        let response = transport
            .request(Method::GET, "/health")
            .await
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }
}
