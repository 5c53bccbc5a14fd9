//! Access-token sources for the mailbox API.
//!
//! Tokens are acquired per call with no caching and no coordination between
//! concurrent callers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::error;

use crate::config::GraphAuth;
use crate::error::MailboxError;

/// Scope requested by the client-credentials flow.
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Supplies bearer tokens for mailbox requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<SecretString, MailboxError>;
}

/// A token obtained out of band.
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: SecretString) -> Self {
        Self(token)
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<SecretString, MailboxError> {
        Ok(self.0.clone())
    }
}

/// OAuth2 client-credentials flow against the tenant's token endpoint.
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    scope: String,
}

impl ClientCredentials {
    pub fn new(
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Result<Self, MailboxError> {
        Self::with_token_url(
            format!("https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0/token"),
            client_id,
            client_secret,
        )
    }

    pub fn with_token_url(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Result<Self, MailboxError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MailboxError::Token(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret,
            scope: GRAPH_DEFAULT_SCOPE.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[async_trait]
impl TokenSource for ClientCredentials {
    async fn access_token(&self) -> Result<SecretString, MailboxError> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("grant_type", "client_credentials"),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| MailboxError::Token(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!(status, "Failed to acquire corporate access token");
            return Err(MailboxError::Token(format!("HTTP {status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| MailboxError::Token(format!("Invalid token response: {e}")))?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| MailboxError::Token("Token response has no access_token".into()))
    }
}

/// Build the token source matching the configured account type.
pub fn token_source(auth: &GraphAuth) -> Result<Arc<dyn TokenSource>, MailboxError> {
    match auth {
        GraphAuth::Delegated { access_token } => Ok(Arc::new(StaticToken::new(access_token.clone()))),
        GraphAuth::Corporate {
            client_id,
            client_secret,
            tenant_id,
        } => Ok(Arc::new(ClientCredentials::new(
            tenant_id,
            client_id.clone(),
            client_secret.clone(),
        )?)),
    }
}
