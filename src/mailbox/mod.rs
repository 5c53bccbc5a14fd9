//! Mailbox access: the REST client, token sources and subscription lifecycle.
//!
//! The workflow only sees [`MailboxGateway`]; [`GraphClient`] is the
//! production implementation.

pub mod auth;
pub mod graph;
pub mod subscriptions;
pub mod types;

pub use auth::{ClientCredentials, StaticToken, TokenSource};
pub use graph::GraphClient;
pub use subscriptions::{Subscription, SubscriptionManager};
pub use types::{DraftRef, MailMessage, MESSAGE_FIELDS, THREAD_FIELDS};

use async_trait::async_trait;

use crate::error::MailboxError;

/// The four mailbox calls the workflow makes.
#[async_trait]
pub trait MailboxGateway: Send + Sync {
    /// Fetch one message with the given field projection. `None` if it does not exist.
    async fn fetch_message(
        &self,
        id: &str,
        fields: &[&str],
    ) -> Result<Option<MailMessage>, MailboxError>;

    /// Fetch every message sharing a conversation id, in the order returned.
    async fn fetch_conversation(
        &self,
        conversation_id: &str,
        fields: &[&str],
    ) -> Result<Vec<MailMessage>, MailboxError>;

    /// Create an empty reply draft linked to `message_id`.
    async fn create_reply_draft(&self, message_id: &str) -> Result<DraftRef, MailboxError>;

    /// Replace a draft's body with plain text.
    async fn update_draft_body(
        &self,
        draft_id: &str,
        content: &str,
    ) -> Result<DraftRef, MailboxError>;
}
