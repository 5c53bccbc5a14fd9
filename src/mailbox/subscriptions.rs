//! Change-notification subscription lifecycle.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::MailboxError;
use crate::mailbox::graph::GraphClient;

/// Default subscription lifetime in days, just under the mail resource maximum.
pub const DEFAULT_EXTENSION_DAYS: f64 = 6.99;

/// Folder watched when none is given.
pub const DEFAULT_FOLDER: &str = "Inbox";

/// Opaque value echoed back in every notification for this subscription.
pub const CLIENT_STATE: &str = "SecretClientState";

const SUBSCRIPTIONS_ENDPOINT: &str = "/subscriptions";

/// A change-notification subscription as reported by the mailbox API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_state: Option<String>,
}

#[derive(Deserialize)]
struct SubscriptionList {
    #[serde(default)]
    value: Vec<Subscription>,
}

/// Create, renew, delete and list subscriptions.
#[async_trait]
pub trait SubscriptionManager: Send + Sync {
    async fn list(&self) -> Result<Vec<Subscription>, MailboxError>;

    async fn create(
        &self,
        notification_url: &str,
        folder: &str,
    ) -> Result<Subscription, MailboxError>;

    async fn renew(
        &self,
        subscription_id: &str,
        extension_days: f64,
    ) -> Result<Subscription, MailboxError>;

    async fn delete(&self, subscription_id: &str) -> Result<(), MailboxError>;
}

/// Expiry timestamp `days` from `now`, at millisecond precision.
pub fn expiry_after(now: DateTime<Utc>, days: f64) -> Result<DateTime<Utc>, MailboxError> {
    if !days.is_finite() || days <= 0.0 {
        return Err(MailboxError::InvalidArgument(format!(
            "extension days must be positive, got {days}"
        )));
    }
    let millis = (days * 24.0 * 60.0 * 60.0 * 1000.0).round() as i64;
    Ok(now + Duration::milliseconds(millis))
}

/// Resource path watched for new messages in `folder`.
pub fn folder_resource(user_id: &str, folder: &str) -> String {
    format!("/{user_id}/mailFolders('{folder}')/messages")
}

#[async_trait]
impl SubscriptionManager for GraphClient {
    async fn list(&self) -> Result<Vec<Subscription>, MailboxError> {
        let response = self
            .send(Method::GET, SUBSCRIPTIONS_ENDPOINT, &[], None)
            .await?;
        let response = Self::check_status(SUBSCRIPTIONS_ENDPOINT, response).await?;
        let list: SubscriptionList = Self::read_json(SUBSCRIPTIONS_ENDPOINT, response).await?;
        info!(count = list.value.len(), "Listed subscriptions");
        Ok(list.value)
    }

    async fn create(
        &self,
        notification_url: &str,
        folder: &str,
    ) -> Result<Subscription, MailboxError> {
        if notification_url.trim().is_empty() {
            return Err(MailboxError::InvalidArgument(
                "notification_url is required".into(),
            ));
        }
        let folder = if folder.trim().is_empty() {
            DEFAULT_FOLDER
        } else {
            folder
        };

        let request = Subscription {
            id: None,
            change_type: Some("created".into()),
            notification_url: Some(notification_url.to_string()),
            resource: Some(folder_resource(self.user_id(), folder)),
            expiration_date_time: Some(expiry_after(Utc::now(), DEFAULT_EXTENSION_DAYS)?),
            client_state: Some(CLIENT_STATE.into()),
        };
        let body = serde_json::to_value(&request).map_err(|e| MailboxError::InvalidArgument(
            format!("unserializable subscription: {e}"),
        ))?;

        let response = self
            .send(Method::POST, SUBSCRIPTIONS_ENDPOINT, &[], Some(&body))
            .await?;
        let response = Self::check_status(SUBSCRIPTIONS_ENDPOINT, response).await?;
        let created: Subscription = Self::read_json(SUBSCRIPTIONS_ENDPOINT, response).await?;

        info!(
            subscription_id = created.id.as_deref().unwrap_or("<none>"),
            folder,
            "Subscription created"
        );
        Ok(created)
    }

    async fn renew(
        &self,
        subscription_id: &str,
        extension_days: f64,
    ) -> Result<Subscription, MailboxError> {
        if subscription_id.trim().is_empty() {
            return Err(MailboxError::InvalidArgument(
                "subscription_id is required".into(),
            ));
        }
        let expiry = expiry_after(Utc::now(), extension_days)?;
        let endpoint = format!("{SUBSCRIPTIONS_ENDPOINT}/{subscription_id}");
        let body = serde_json::json!({ "expirationDateTime": expiry });

        let response = self.send(Method::PATCH, &endpoint, &[], Some(&body)).await?;
        let response = Self::check_status(&endpoint, response).await?;
        let renewed: Subscription = Self::read_json(&endpoint, response).await?;

        info!(subscription_id, expires = %expiry, "Subscription renewed");
        Ok(renewed)
    }

    async fn delete(&self, subscription_id: &str) -> Result<(), MailboxError> {
        if subscription_id.trim().is_empty() {
            return Err(MailboxError::InvalidArgument(
                "subscription_id is required".into(),
            ));
        }
        let endpoint = format!("{SUBSCRIPTIONS_ENDPOINT}/{subscription_id}");
        let response = self.send(Method::DELETE, &endpoint, &[], None).await?;
        Self::check_status(&endpoint, response).await?;
        info!(subscription_id, "Subscription deleted");
        Ok(())
    }
}
