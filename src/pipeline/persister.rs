//! Draft Persister: stores an accepted reply as a draft in the mailbox.

use std::sync::Arc;

use tracing::info;

use crate::error::PipelineError;
use crate::mailbox::MailboxGateway;

pub struct DraftPersister {
    mailbox: Arc<dyn MailboxGateway>,
}

impl DraftPersister {
    pub fn new(mailbox: Arc<dyn MailboxGateway>) -> Self {
        Self { mailbox }
    }

    /// Create a reply draft for `message_id` and fill it with `content`.
    /// Returns the draft id. A draft created before a failed update is left in place.
    pub async fn persist(&self, message_id: &str, content: &str) -> Result<String, PipelineError> {
        let fail = |reason: String| PipelineError::Persist {
            message_id: message_id.to_string(),
            reason,
        };

        let created = self
            .mailbox
            .create_reply_draft(message_id)
            .await
            .map_err(|e| fail(format!("create reply draft: {e}")))?;
        let draft_id = created
            .id()
            .ok_or_else(|| fail("create reply draft returned no id".into()))?
            .to_string();

        let updated = self
            .mailbox
            .update_draft_body(&draft_id, content)
            .await
            .map_err(|e| fail(format!("update draft {draft_id}: {e}")))?;
        let final_id = updated
            .id()
            .ok_or_else(|| fail(format!("update draft {draft_id} returned no id")))?
            .to_string();

        info!(message_id, draft_id = %final_id, "Draft saved");
        Ok(final_id)
    }
}
