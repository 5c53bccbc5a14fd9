//! Draft Composer: produces a reply body, optionally revising a rejected draft.

use std::sync::Arc;

use tracing::debug;

use crate::error::PipelineError;
use crate::llm::{ComposeRequest, LanguageCapabilities};
use crate::pipeline::types::{DraftFeedback, EmailRecord};

pub struct DraftComposer {
    llm: Arc<dyn LanguageCapabilities>,
}

impl DraftComposer {
    pub fn new(llm: Arc<dyn LanguageCapabilities>) -> Self {
        Self { llm }
    }

    /// Write a reply to `email`. A provider error or blank output is a composition failure.
    pub async fn compose(
        &self,
        email: &EmailRecord,
        summary: Option<&str>,
        feedback: Option<&DraftFeedback>,
    ) -> Result<String, PipelineError> {
        let request = ComposeRequest {
            subject: &email.clean_subject,
            body: &email.clean_body,
            sender: &email.sender,
            summary,
            feedback: feedback.map(|f| (f.draft.as_str(), f.reason.as_str())),
        };

        let draft = self
            .llm
            .compose_reply(request)
            .await
            .map_err(|e| PipelineError::Composition(e.to_string()))?;

        if draft.trim().is_empty() {
            return Err(PipelineError::Composition("model returned an empty draft".into()));
        }

        debug!(
            message_id = %email.id,
            chars = draft.len(),
            revision = feedback.is_some(),
            "Draft composed"
        );
        Ok(draft)
    }
}
