//! Mailbox wire types — the subset of message fields the workflow consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field projection used when fetching a notified message.
pub const MESSAGE_FIELDS: &[&str] = &[
    "id",
    "subject",
    "body",
    "conversationId",
    "internetMessageId",
    "receivedDateTime",
    "sender",
    "toRecipients",
    "parentFolderId",
];

/// Field projection used when fetching the rest of a thread.
pub const THREAD_FIELDS: &[&str] = &["id", "subject", "body", "sender", "receivedDateTime"];

/// A mailbox message. `id` is required; a payload without one is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessage {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<ItemBody>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub internet_message_id: Option<String>,
    #[serde(default)]
    pub received_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sender: Option<Recipient>,
    #[serde(default)]
    pub to_recipients: Vec<Recipient>,
    #[serde(default)]
    pub parent_folder_id: Option<String>,
}

impl MailMessage {
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or_default()
    }

    pub fn body_content(&self) -> &str {
        self.body.as_ref().map(|b| b.content.as_str()).unwrap_or_default()
    }

    /// Sender address, empty when absent.
    pub fn sender_address(&self) -> &str {
        self.sender
            .as_ref()
            .and_then(|s| s.email_address.address.as_deref())
            .unwrap_or_default()
    }

    /// To-recipient addresses, skipping entries without one.
    pub fn recipient_addresses(&self) -> Vec<String> {
        self.to_recipients
            .iter()
            .filter_map(|r| r.email_address.address.clone())
            .collect()
    }

    /// Conversation id, treating an empty string as absent.
    pub fn conversation(&self) -> Option<&str> {
        self.conversation_id.as_deref().filter(|c| !c.is_empty())
    }
}

/// Message body with its content type (`html` or `text`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email_address: EmailAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAddress {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Identifier returned by draft create/update calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftRef {
    #[serde(default)]
    pub id: Option<String>,
}

impl DraftRef {
    /// The identifier, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A page of a message collection.
#[derive(Debug, Deserialize)]
pub(crate) struct MessagePage {
    #[serde(default)]
    pub value: Vec<MailMessage>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}
