//! Access token sources for authenticated API calls.
//!
//! Tokens are kept as [`SecretString`] and never logged.

mod credentials;

pub use credentials::{ClientCredentials, REFRESH_MARGIN};
use secrecy::SecretString;

use crate::error::Result;

/// Tracing target for token acquisition.
pub const TRACING_TARGET: &str = "folio_reqwest::auth";

/// Supplies bearer tokens for outgoing requests.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a token valid for at least the next request.
    async fn access_token(&self) -> Result<SecretString>;
}

/// A fixed, pre-issued token.
#[derive(Clone)]
pub struct StaticToken {
    token: SecretString,
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken").finish_non_exhaustive()
    }
}

impl StaticToken {
    /// Wraps `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<SecretString> {
        use secrecy::ExposeSecret;

        Ok(SecretString::from(self.token.expose_secret().to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticToken::new("abc");
        assert_eq!(provider.access_token().await.unwrap().expose_secret(), "abc");
        assert!(!format!("{provider:?}").contains("abc"));
    }
}
