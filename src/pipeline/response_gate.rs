//! Response Gate: decides whether an email warrants a reply at all.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::PipelineError;
use crate::llm::{LanguageCapabilities, RespondLabel};
use crate::pipeline::types::EmailRecord;

pub struct ResponseGate {
    llm: Arc<dyn LanguageCapabilities>,
}

impl ResponseGate {
    pub fn new(llm: Arc<dyn LanguageCapabilities>) -> Self {
        Self { llm }
    }

    /// Classify `email` as RESPOND or SKIP.
    ///
    /// Blank emails are skipped without consulting the model, and a
    /// classification error counts as SKIP.
    pub async fn classify(&self, email: &EmailRecord) -> RespondLabel {
        if email.is_blank() {
            info!(message_id = %email.id, "Blank subject and body, skipping");
            return RespondLabel::Skip;
        }

        match self
            .llm
            .classify_respond(&email.clean_subject, &email.clean_body)
            .await
        {
            Ok(label) => {
                info!(message_id = %email.id, label = label.as_str(), "Email classified");
                label
            }
            Err(e) => {
                let err = PipelineError::Classification(e.to_string());
                warn!(message_id = %email.id, stage = %err.stage(), error = %err, "Treating as SKIP");
                RespondLabel::Skip
            }
        }
    }
}
