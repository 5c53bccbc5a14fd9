//! Redraft Orchestrator: the bounded compose → validate loop.
//!
//! Attempt `n` runs from `0` to `max_attempts` inclusive, so at most
//! `max_attempts + 1` drafts are composed. Each revision sees only the
//! immediately preceding draft and its rejection reason.

use tracing::{info, warn};

use crate::error::PipelineError;
use crate::pipeline::composer::DraftComposer;
use crate::pipeline::quality_gate::QualityGate;
use crate::pipeline::types::{DraftAttempt, DraftFeedback, EmailRecord};

/// Terminal state of the loop.
#[derive(Debug)]
pub enum RedraftOutcome {
    /// A draft passed validation on attempt number `attempts` (1-based).
    Accepted { draft: String, attempts: u32 },
    /// Every attempt was rejected. Holds the final attempt.
    Abandoned { last: DraftAttempt },
    /// Composition failed; no further attempts were made.
    Failed(PipelineError),
}

pub struct RedraftOrchestrator {
    composer: DraftComposer,
    gate: QualityGate,
    max_attempts: u32,
}

impl RedraftOrchestrator {
    pub fn new(composer: DraftComposer, gate: QualityGate, max_attempts: u32) -> Self {
        Self {
            composer,
            gate,
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn run(&self, email: &EmailRecord, summary: Option<&str>) -> RedraftOutcome {
        let mut feedback: Option<DraftFeedback> = None;
        let mut n: u32 = 0;

        loop {
            let draft = match self.composer.compose(email, summary, feedback.as_ref()).await {
                Ok(draft) => draft,
                Err(e) => {
                    warn!(message_id = %email.id, attempt = n, error = %e, "Composition failed");
                    return RedraftOutcome::Failed(e);
                }
            };

            let verdict = self.gate.evaluate(email, &draft, summary).await;
            let attempt = DraftAttempt {
                index: n,
                content: draft,
                verdict,
            };

            if attempt.verdict.accepted {
                info!(message_id = %email.id, attempts = n + 1, "Draft accepted");
                return RedraftOutcome::Accepted {
                    draft: attempt.content,
                    attempts: n + 1,
                };
            }

            if n >= self.max_attempts {
                info!(
                    message_id = %email.id,
                    attempts = n + 1,
                    reason = %attempt.verdict.reason,
                    "Draft rejected on final attempt, abandoning"
                );
                return RedraftOutcome::Abandoned { last: attempt };
            }

            info!(
                message_id = %email.id,
                attempt = n,
                reason = %attempt.verdict.reason,
                "Draft rejected, redrafting"
            );
            feedback = attempt.feedback();
            n += 1;
        }
    }
}
