//! Quality Gate: accepts or rejects a draft, always with a reason.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::PipelineError;
use crate::llm::{LanguageCapabilities, SendableLabel};
use crate::pipeline::types::{EmailRecord, Verdict};

/// Reason recorded when the validator gives none.
pub const MISSING_REASON: &str = "no reason given";

pub struct QualityGate {
    llm: Arc<dyn LanguageCapabilities>,
}

impl QualityGate {
    pub fn new(llm: Arc<dyn LanguageCapabilities>) -> Self {
        Self { llm }
    }

    /// Judge `draft` as a reply to `email`. Never fails: a validator error
    /// becomes a rejection whose reason carries the cause.
    pub async fn evaluate(
        &self,
        email: &EmailRecord,
        draft: &str,
        summary: Option<&str>,
    ) -> Verdict {
        let judgement = self
            .llm
            .classify_sendable(&email.clean_subject, &email.clean_body, draft, summary)
            .await;

        match judgement {
            Ok(judgement) => {
                let verdict = Verdict {
                    accepted: judgement.label == SendableLabel::Sendable,
                    reason: judgement.reason.unwrap_or_else(|| MISSING_REASON.to_string()),
                };
                info!(
                    message_id = %email.id,
                    accepted = verdict.accepted,
                    reason = %verdict.reason,
                    "Draft evaluated"
                );
                verdict
            }
            Err(e) => {
                let err = PipelineError::Validation(e.to_string());
                warn!(message_id = %email.id, stage = %err.stage(), error = %err, "Validator failed, rejecting draft");
                Verdict {
                    accepted: false,
                    reason: format!("validation error: {e}"),
                }
            }
        }
    }
}
