//! API authentication configuration.

use std::sync::Arc;

use anyhow::bail;
use clap::Args;
use folio_reqwest::{ClientCredentials, StaticToken, TokenProvider};
use secrecy::SecretString;
use url::Url;

/// How the CLI authenticates against the import API.
///
/// Either a pre-issued token, or OAuth2 client credentials exchanged for
/// tokens on demand. Without either, requests are sent unauthenticated.
#[derive(Clone, Default, Args)]
pub struct AuthConfig {
    /// Pre-issued bearer token
    #[arg(long = "api-token", env = "API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// OAuth2 token endpoint for the client-credentials grant
    #[arg(long = "auth-token-url", env = "AUTH_TOKEN_URL")]
    pub token_url: Option<Url>,

    /// OAuth2 client identifier
    #[arg(long = "auth-client-id", env = "AUTH_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth2 client secret
    #[arg(
        long = "auth-client-secret",
        env = "AUTH_CLIENT_SECRET",
        hide_env_values = true
    )]
    pub client_secret: Option<String>,

    /// Audience requested with client-credentials tokens
    #[arg(long = "auth-audience", env = "AUTH_AUDIENCE")]
    pub audience: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("token_url", &self.token_url.as_ref().map(Url::as_str))
            .field("client_id", &self.client_id)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl AuthConfig {
    /// Name of the configured method, for logs.
    pub fn method(&self) -> &'static str {
        if self.api_token.is_some() {
            "static_token"
        } else if self.token_url.is_some() {
            "client_credentials"
        } else {
            "none"
        }
    }

    /// Validates that at most one method is configured, and completely.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_token.is_some() && self.token_url.is_some() {
            bail!("--api-token and --auth-token-url are mutually exclusive");
        }

        if self.api_token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            bail!("--api-token must not be empty");
        }

        if self.token_url.is_some() && (self.client_id.is_none() || self.client_secret.is_none())
        {
            bail!("--auth-token-url requires --auth-client-id and --auth-client-secret");
        }

        Ok(())
    }

    /// Builds the token provider for the configured method, if any.
    pub fn token_provider(&self) -> Option<Arc<dyn TokenProvider>> {
        if let Some(token) = &self.api_token {
            return Some(Arc::new(StaticToken::new(token.clone())));
        }

        let (Some(token_url), Some(client_id), Some(client_secret)) =
            (&self.token_url, &self.client_id, &self.client_secret)
        else {
            return None;
        };

        let credentials = ClientCredentials::new(
            token_url.clone(),
            client_id.clone(),
            SecretString::from(client_secret.clone()),
        );

        Some(Arc::new(match &self.audience {
            Some(audience) => credentials.with_audience(audience.clone()),
            None => credentials,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> AuthConfig {
        AuthConfig {
            token_url: Some(Url::parse("https://auth.example.com/oauth/token").unwrap()),
            client_id: Some("folio-cli".into()),
            client_secret: Some("s3cret".into()),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_no_auth_is_valid() {
        let config = AuthConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.token_provider().is_none());
        assert_eq!(config.method(), "none");
    }

    #[test]
    fn test_methods_are_exclusive() {
        let config = AuthConfig {
            api_token: Some("abc".into()),
            ..credentials()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_incomplete_credentials() {
        let config = AuthConfig {
            client_secret: None,
            ..credentials()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_credentials_provider() {
        let config = credentials();
        assert!(config.validate().is_ok());
        assert!(config.token_provider().is_some());
        assert_eq!(config.method(), "client_credentials");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AuthConfig {
            api_token: Some("abc".into()),
            ..AuthConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("abc"));
    }
}
