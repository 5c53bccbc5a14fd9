//! Mailbox REST client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::config::GraphConfig;
use crate::error::MailboxError;
use crate::mailbox::auth::{self, TokenSource};
use crate::mailbox::types::{DraftRef, MailMessage, MessagePage};
use crate::mailbox::MailboxGateway;

/// Transport timeout for a single mailbox request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on pages followed when listing a conversation.
const MAX_CONVERSATION_PAGES: usize = 10;

/// Mailbox API client addressing a single mailbox (`me` or `users/{email}`).
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
    tokens: Arc<dyn TokenSource>,
}

impl GraphClient {
    pub fn new(
        base_url: impl Into<String>,
        user_id: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, MailboxError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MailboxError::RequestFailed {
                endpoint: "client".into(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id: user_id.into(),
            tokens,
        })
    }

    pub fn from_config(config: &GraphConfig) -> Result<Self, MailboxError> {
        Self::new(
            config.base_url.clone(),
            config.user_id.clone(),
            auth::token_source(&config.auth)?,
        )
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Send a request to `endpoint` (relative to the base URL, or absolute).
    pub(crate) async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, MailboxError> {
        let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url, endpoint)
        };
        let token = self.tokens.access_token().await?;

        debug!(method = %method, url = %url, "Mailbox request");

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(token.expose_secret());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(|e| MailboxError::RequestFailed {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    /// Map a non-success status to an error, keeping the response body.
    pub(crate) async fn check_status(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MailboxError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(endpoint, status = status.as_u16(), body = %body, "Mailbox request failed");
        Err(MailboxError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    pub(crate) async fn read_json<T: DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T, MailboxError> {
        response
            .json()
            .await
            .map_err(|e| MailboxError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }

    fn messages_endpoint(&self) -> String {
        format!("/{}/messages", self.user_id)
    }

    fn message_endpoint(&self, id: &str) -> String {
        format!("/{}/messages/{}", self.user_id, urlencoding::encode(id))
    }
}

#[async_trait]
impl MailboxGateway for GraphClient {
    async fn fetch_message(
        &self,
        id: &str,
        fields: &[&str],
    ) -> Result<Option<MailMessage>, MailboxError> {
        if id.trim().is_empty() {
            return Err(MailboxError::InvalidArgument("message id is empty".into()));
        }
        let endpoint = self.message_endpoint(id.trim());
        let query = select_query(fields);
        let response = self.send(Method::GET, &endpoint, &query, None).await?;

        if response.status() == StatusCode::NOT_FOUND {
            info!(message_id = id, "Message not found");
            return Ok(None);
        }
        let response = Self::check_status(&endpoint, response).await?;
        Self::read_json(&endpoint, response).await.map(Some)
    }

    async fn fetch_conversation(
        &self,
        conversation_id: &str,
        fields: &[&str],
    ) -> Result<Vec<MailMessage>, MailboxError> {
        if conversation_id.is_empty() {
            return Err(MailboxError::InvalidArgument("conversation id is empty".into()));
        }
        let mut query = select_query(fields);
        query.push((
            "$filter",
            format!("conversationId eq '{}'", conversation_id.replace('\'', "''")),
        ));

        let mut messages = Vec::new();
        let mut endpoint = self.messages_endpoint();
        for page_no in 0..MAX_CONVERSATION_PAGES {
            // Next links already carry the query.
            let page_query: &[(&str, String)] = if page_no == 0 { &query } else { &[] };
            let response = self.send(Method::GET, &endpoint, page_query, None).await?;
            let response = Self::check_status(&endpoint, response).await?;
            let page: MessagePage = Self::read_json(&endpoint, response).await?;
            messages.extend(page.value);
            match page.next_link {
                Some(next) => endpoint = next,
                None => break,
            }
        }

        debug!(conversation_id, count = messages.len(), "Fetched conversation");
        Ok(messages)
    }

    async fn create_reply_draft(&self, message_id: &str) -> Result<DraftRef, MailboxError> {
        let endpoint = format!("{}/createReply", self.message_endpoint(message_id));
        let response = self
            .send(Method::POST, &endpoint, &[], Some(&serde_json::json!({})))
            .await?;
        let response = Self::check_status(&endpoint, response).await?;
        Self::read_json(&endpoint, response).await
    }

    async fn update_draft_body(
        &self,
        draft_id: &str,
        content: &str,
    ) -> Result<DraftRef, MailboxError> {
        let endpoint = self.message_endpoint(draft_id);
        let body = serde_json::json!({
            "body": {
                "contentType": "Text",
                "content": content,
            }
        });
        let response = self.send(Method::PATCH, &endpoint, &[], Some(&body)).await?;
        let response = Self::check_status(&endpoint, response).await?;
        Self::read_json(&endpoint, response).await
    }
}

fn select_query(fields: &[&str]) -> Vec<(&'static str, String)> {
    if fields.is_empty() {
        Vec::new()
    } else {
        vec![("$select", fields.join(","))]
    }
}
