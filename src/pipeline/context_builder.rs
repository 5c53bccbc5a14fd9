//! Context Builder: fetches the notified message, normalizes it, and condenses
//! the rest of its conversation into a summary.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::llm::LanguageCapabilities;
use crate::mailbox::{MailMessage, MailboxGateway, MESSAGE_FIELDS, THREAD_FIELDS};
use crate::pipeline::types::{EmailRecord, ThreadMessage};
use crate::sanitize::Sanitizer;

/// Everything the later stages need about one notified message.
#[derive(Debug, Clone)]
pub struct EmailContext {
    pub email: EmailRecord,
    /// Present only for multi-message threads whose summarization succeeded.
    pub summary: Option<String>,
}

pub struct ContextBuilder {
    mailbox: Arc<dyn MailboxGateway>,
    sanitizer: Arc<dyn Sanitizer>,
    llm: Arc<dyn LanguageCapabilities>,
}

impl ContextBuilder {
    pub fn new(
        mailbox: Arc<dyn MailboxGateway>,
        sanitizer: Arc<dyn Sanitizer>,
        llm: Arc<dyn LanguageCapabilities>,
    ) -> Self {
        Self {
            mailbox,
            sanitizer,
            llm,
        }
    }

    /// Build the context for `message_id`.
    ///
    /// A missing message or any mailbox error is a fetch failure. A failed
    /// summary is not: the context is returned without one.
    pub async fn build(&self, message_id: &str) -> Result<EmailContext, PipelineError> {
        let message = self
            .mailbox
            .fetch_message(message_id, MESSAGE_FIELDS)
            .await
            .map_err(|e| PipelineError::Fetch {
                message_id: message_id.to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| PipelineError::Fetch {
                message_id: message_id.to_string(),
                reason: "message not found".into(),
            })?;

        let email = self.to_record(&message);
        debug!(
            message_id = %email.id,
            sender = %email.sender,
            subject = %email.clean_subject,
            "Fetched message"
        );

        let summary = match email.conversation_id.as_deref() {
            Some(conversation_id) => self.summarize_conversation(&email, conversation_id).await?,
            None => None,
        };

        Ok(EmailContext { email, summary })
    }

    fn to_record(&self, message: &MailMessage) -> EmailRecord {
        EmailRecord {
            id: message.id.clone(),
            raw_subject: message.subject().to_string(),
            raw_body: message.body_content().to_string(),
            clean_subject: self.sanitizer.clean(message.subject()),
            clean_body: self.sanitizer.clean(message.body_content()),
            conversation_id: message.conversation().map(str::to_string),
            internet_message_id: message.internet_message_id.clone(),
            sender: message.sender_address().to_string(),
            recipients: message.recipient_addresses(),
            received_at: message.received_date_time,
        }
    }

    async fn summarize_conversation(
        &self,
        email: &EmailRecord,
        conversation_id: &str,
    ) -> Result<Option<String>, PipelineError> {
        let thread = self
            .mailbox
            .fetch_conversation(conversation_id, THREAD_FIELDS)
            .await
            .map_err(|e| PipelineError::Fetch {
                message_id: email.id.clone(),
                reason: format!("conversation {conversation_id}: {e}"),
            })?;

        if thread.len() < 2 {
            debug!(message_id = %email.id, "Single-message thread, no summary");
            return Ok(None);
        }

        let earlier: Vec<ThreadMessage> = thread
            .iter()
            .filter(|m| m.id != email.id)
            .map(|m| ThreadMessage {
                sender: m.sender_address().to_string(),
                subject: self.sanitizer.clean(m.subject()),
                body: self.sanitizer.clean(m.body_content()),
            })
            .collect();

        match self.llm.summarize_thread(&earlier).await {
            Ok(summary) => {
                info!(
                    message_id = %email.id,
                    thread_len = thread.len(),
                    summarized = summary.is_some(),
                    "Conversation summarized"
                );
                Ok(summary)
            }
            Err(e) => {
                warn!(message_id = %email.id, error = %e, "Summarization failed, continuing without summary");
                Ok(None)
            }
        }
    }
}
