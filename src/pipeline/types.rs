//! Shared types for the drafting workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Stage};

// ── Inbound notification ────────────────────────────────────────────

/// Marker preceding the message id in a notification resource path.
const MESSAGES_SEGMENT: &str = "Messages/";

/// One change notification as delivered by the mailbox service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundNotification {
    #[serde(default)]
    pub change_type: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_state: Option<String>,
}

impl InboundNotification {
    /// Id of the newly created message, or `None` if this notification is not
    /// one the workflow acts on.
    pub fn message_id(&self) -> Option<&str> {
        if self.change_type != "created" {
            return None;
        }
        self.resource
            .rsplit_once(MESSAGES_SEGMENT)
            .map(|(_, id)| id.trim())
            .filter(|id| !id.is_empty())
    }
}

/// Notification batch: `{"value": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(default)]
    pub value: Vec<InboundNotification>,
}

// ── Email context ───────────────────────────────────────────────────

/// The triggering message, normalized once per notification.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailRecord {
    pub id: String,
    pub raw_subject: String,
    pub raw_body: String,
    pub clean_subject: String,
    pub clean_body: String,
    pub conversation_id: Option<String>,
    pub internet_message_id: Option<String>,
    pub sender: String,
    pub recipients: Vec<String>,
    pub received_at: Option<DateTime<Utc>>,
}

impl EmailRecord {
    /// True when there is nothing to classify or reply to.
    pub fn is_blank(&self) -> bool {
        self.clean_subject.trim().is_empty() && self.clean_body.trim().is_empty()
    }
}

/// A sanitized message from the same conversation, used for summarization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub sender: String,
    pub subject: String,
    pub body: String,
}

// ── Drafting ────────────────────────────────────────────────────────

/// Accept/reject decision with the validator's reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    pub reason: String,
}

/// The previous rejected draft and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftFeedback {
    pub draft: String,
    pub reason: String,
}

/// One compose+validate cycle. `index` is zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftAttempt {
    pub index: u32,
    pub content: String,
    pub verdict: Verdict,
}

impl DraftAttempt {
    /// Feedback for the next attempt, if this one was rejected.
    pub fn feedback(&self) -> Option<DraftFeedback> {
        (!self.verdict.accepted).then(|| DraftFeedback {
            draft: self.content.clone(),
            reason: self.verdict.reason.clone(),
        })
    }
}

// ── Outcome ─────────────────────────────────────────────────────────

/// How one notification's processing ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Persisted { draft_id: String },
    SkippedNotRespondable,
    AbandonedMaxAttempts,
    Failed { stage: Stage, cause: String },
}

impl WorkflowOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Persisted { .. } => "persisted",
            Self::SkippedNotRespondable => "skipped_not_respondable",
            Self::AbandonedMaxAttempts => "abandoned_max_attempts",
            Self::Failed { .. } => "failed",
        }
    }
}

impl From<PipelineError> for WorkflowOutcome {
    fn from(err: PipelineError) -> Self {
        Self::Failed {
            stage: err.stage(),
            cause: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(change_type: &str, resource: &str) -> InboundNotification {
        InboundNotification {
            change_type: change_type.into(),
            resource: resource.into(),
            ..Default::default()
        }
    }

    #[test]
    fn created_message_notification_yields_id() {
        let n = notification("created", "Users/abc/Messages/AAMkAD=");
        assert_eq!(n.message_id(), Some("AAMkAD="));
    }

    #[test]
    fn other_change_types_are_ignored() {
        assert!(notification("updated", "Users/abc/Messages/AAMk").message_id().is_none());
        assert!(notification("deleted", "Users/abc/Messages/AAMk").message_id().is_none());
    }

    #[test]
    fn resource_without_message_segment_is_ignored() {
        assert!(notification("created", "Users/abc/Events/1").message_id().is_none());
        assert!(notification("created", "Users/abc/Messages/").message_id().is_none());
        assert!(notification("created", "").message_id().is_none());
    }

    #[test]
    fn last_message_segment_wins() {
        let n = notification("created", "Messages/outer/Messages/inner");
        assert_eq!(n.message_id(), Some("inner"));
    }

    #[test]
    fn payload_deserializes_graph_shape() {
        let payload: NotificationPayload = serde_json::from_str(
            r#"{"value": [{
                "subscriptionId": "sub-1",
                "changeType": "created",
                "resource": "Users/u/Messages/m1",
                "clientState": "SecretClientState",
                "tenantId": "t"
            }]}"#,
        )
        .unwrap();
        assert_eq!(payload.value.len(), 1);
        assert_eq!(payload.value[0].message_id(), Some("m1"));
        assert_eq!(payload.value[0].subscription_id.as_deref(), Some("sub-1"));
    }

    #[test]
    fn payload_without_value_is_empty() {
        let payload: NotificationPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.value.is_empty());
    }

    #[test]
    fn rejected_attempt_produces_feedback() {
        let attempt = DraftAttempt {
            index: 0,
            content: "Sure.".into(),
            verdict: Verdict {
                accepted: false,
                reason: "Too short".into(),
            },
        };
        assert_eq!(
            attempt.feedback(),
            Some(DraftFeedback {
                draft: "Sure.".into(),
                reason: "Too short".into()
            })
        );

        let accepted = DraftAttempt {
            verdict: Verdict {
                accepted: true,
                reason: "Good".into(),
            },
            ..attempt
        };
        assert!(accepted.feedback().is_none());
    }

    #[test]
    fn pipeline_error_becomes_failed_outcome() {
        let outcome: WorkflowOutcome = PipelineError::Composition("empty draft".into()).into();
        match outcome {
            WorkflowOutcome::Failed { stage, cause } => {
                assert_eq!(stage, Stage::Compose);
                assert!(cause.contains("empty draft"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(WorkflowOutcome::AbandonedMaxAttempts.label(), "abandoned_max_attempts");
    }
}
