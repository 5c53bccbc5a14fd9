//! End-to-end drafting workflow for one notification.
//!
//! notification → context → response gate → redraft loop → persist.
//! Each notification runs as its own spawned task with no queueing and no
//! concurrency limit; outcomes are only logged.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::WorkflowConfig;
use crate::llm::{LanguageCapabilities, RespondLabel};
use crate::mailbox::MailboxGateway;
use crate::pipeline::composer::DraftComposer;
use crate::pipeline::context_builder::ContextBuilder;
use crate::pipeline::persister::DraftPersister;
use crate::pipeline::quality_gate::QualityGate;
use crate::pipeline::redraft::{RedraftOrchestrator, RedraftOutcome};
use crate::pipeline::response_gate::ResponseGate;
use crate::pipeline::types::{InboundNotification, NotificationPayload, WorkflowOutcome};
use crate::sanitize::Sanitizer;

pub struct DraftWorkflow {
    context: ContextBuilder,
    gate: ResponseGate,
    redraft: RedraftOrchestrator,
    persister: DraftPersister,
}

impl DraftWorkflow {
    pub fn new(
        mailbox: Arc<dyn MailboxGateway>,
        llm: Arc<dyn LanguageCapabilities>,
        sanitizer: Arc<dyn Sanitizer>,
        config: &WorkflowConfig,
    ) -> Self {
        Self {
            context: ContextBuilder::new(mailbox.clone(), sanitizer, llm.clone()),
            gate: ResponseGate::new(llm.clone()),
            redraft: RedraftOrchestrator::new(
                DraftComposer::new(llm.clone()),
                QualityGate::new(llm),
                config.max_redraft_tries,
            ),
            persister: DraftPersister::new(mailbox),
        }
    }

    /// Process one notification. `None` when it is not a new-message
    /// notification, in which case no external call is made.
    pub async fn handle_notification(
        &self,
        notification: &InboundNotification,
    ) -> Option<WorkflowOutcome> {
        let Some(message_id) = notification.message_id() else {
            debug!(
                change_type = %notification.change_type,
                resource = %notification.resource,
                "Ignoring notification"
            );
            return None;
        };
        Some(self.run(message_id).await)
    }

    /// Run the workflow for `message_id` and log the outcome.
    pub async fn run(&self, message_id: &str) -> WorkflowOutcome {
        let outcome = self.execute(message_id).await;
        match &outcome {
            WorkflowOutcome::Persisted { draft_id } => {
                info!(message_id, draft_id = %draft_id, outcome = outcome.label(), "Workflow finished");
            }
            WorkflowOutcome::Failed { stage, cause } => {
                error!(message_id, stage = %stage, cause = %cause, outcome = outcome.label(), "Workflow failed");
            }
            _ => info!(message_id, outcome = outcome.label(), "Workflow finished"),
        }
        outcome
    }

    async fn execute(&self, message_id: &str) -> WorkflowOutcome {
        let ctx = match self.context.build(message_id).await {
            Ok(ctx) => ctx,
            Err(e) => return e.into(),
        };

        if self.gate.classify(&ctx.email).await == RespondLabel::Skip {
            return WorkflowOutcome::SkippedNotRespondable;
        }

        match self.redraft.run(&ctx.email, ctx.summary.as_deref()).await {
            RedraftOutcome::Accepted { draft, .. } => {
                match self.persister.persist(&ctx.email.id, &draft).await {
                    Ok(draft_id) => WorkflowOutcome::Persisted { draft_id },
                    Err(e) => e.into(),
                }
            }
            RedraftOutcome::Abandoned { .. } => WorkflowOutcome::AbandonedMaxAttempts,
            RedraftOutcome::Failed(e) => e.into(),
        }
    }

    /// Spawn one task per notification in `payload`.
    ///
    /// Every task runs inside a `draft_workflow` span carrying the message id
    /// and a fresh run id. Handles are returned for callers that want to
    /// await outcomes; the HTTP handler drops them.
    pub fn dispatch(
        self: &Arc<Self>,
        payload: NotificationPayload,
    ) -> Vec<JoinHandle<Option<WorkflowOutcome>>> {
        info!(count = payload.value.len(), "Dispatching notifications");
        payload
            .value
            .into_iter()
            .map(|notification| {
                let workflow = Arc::clone(self);
                let span = info_span!(
                    "draft_workflow",
                    message_id = notification.message_id().unwrap_or_default(),
                    run_id = %Uuid::new_v4(),
                );
                tokio::spawn(
                    async move { workflow.handle_notification(&notification).await }
                        .instrument(span),
                )
            })
            .collect()
    }
}
