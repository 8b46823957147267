//! OAuth2 client-credentials token source.

use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use super::{TRACING_TARGET, TokenProvider};
use crate::error::{Error, Result};

/// Tokens are refreshed this long before they expire.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    token: SecretString,
    refresh_at: Timestamp,
}

/// Fetches tokens from an OAuth2 token endpoint with the
/// `client_credentials` grant and caches them until shortly before expiry.
///
/// Concurrent callers share one refresh.
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: SecretString,
    audience: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl ClientCredentials {
    /// Creates a token source for the given client.
    pub fn new(
        token_url: Url,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url,
            client_id: client_id.into(),
            client_secret,
            audience: None,
            cached: Mutex::new(None),
        }
    }

    /// Requests tokens for `audience`.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Uses `http` for token requests.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let mut params = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
        ];
        if let Some(audience) = &self.audience {
            params.push(("audience", audience.as_str()));
        }

        tracing::debug!(
            target: TRACING_TARGET,
            token_url = %self.token_url,
            client_id = %self.client_id,
            "Requesting access token"
        );

        let response = self
            .http
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Token(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                target: TRACING_TARGET,
                status = status.as_u16(),
                "Token endpoint rejected the client"
            );
            return Err(Error::Token(format!("token endpoint returned {status}")));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|_| Error::Token("invalid token response".to_owned()))?;

        let now = Timestamp::now();
        let refresh_at = body
            .expires_in
            .map(|secs| secs.saturating_sub(REFRESH_MARGIN.as_secs()))
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| now.checked_add(SignedDuration::from_secs(secs)).ok())
            .unwrap_or(now);

        tracing::info!(
            target: TRACING_TARGET,
            expires_in = body.expires_in,
            "Access token acquired"
        );

        Ok(CachedToken {
            token: SecretString::from(body.access_token),
            refresh_at,
        })
    }
}

#[async_trait::async_trait]
impl TokenProvider for ClientCredentials {
    async fn access_token(&self) -> Result<SecretString> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| Timestamp::now() < t.refresh_at) {
            return Ok(SecretString::from(token.token.expose_secret().to_owned()));
        }

        let fresh = self.fetch().await?;
        let token = SecretString::from(fresh.token.expose_secret().to_owned());
        *cached = Some(fresh);
        Ok(token)
    }
}
