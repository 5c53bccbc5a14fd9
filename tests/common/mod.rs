//! Counting stubs shared by the integration tests (no real API calls).

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mail_drafter::config::WorkflowConfig;
use mail_drafter::error::{LlmError, MailboxError};
use mail_drafter::llm::{
    ComposeRequest, LanguageCapabilities, RespondLabel, SendableJudgement, SendableLabel,
};
use mail_drafter::mailbox::{DraftRef, MailMessage, MailboxGateway};
use mail_drafter::pipeline::types::ThreadMessage;
use mail_drafter::pipeline::{DraftWorkflow, InboundNotification};
use mail_drafter::sanitize::HtmlSanitizer;

pub fn stub_error(reason: &str) -> LlmError {
    LlmError::RequestFailed {
        provider: "stub".into(),
        reason: reason.into(),
    }
}

pub fn mail(id: &str, conversation_id: &str, subject: &str, body: &str) -> MailMessage {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "subject": subject,
        "body": {"contentType": "html", "content": body},
        "conversationId": conversation_id,
        "receivedDateTime": "2026-03-02T09:30:00Z",
        "sender": {"emailAddress": {"name": "Alice", "address": "alice@example.com"}},
        "toRecipients": [{"emailAddress": {"address": "me@example.com"}}],
    }))
    .unwrap()
}

pub fn created(message_id: &str) -> InboundNotification {
    InboundNotification {
        change_type: "created".into(),
        resource: format!("Users/0001/Messages/{message_id}"),
        ..Default::default()
    }
}

// ── Language capabilities ───────────────────────────────────────────

/// One recorded call to the stub.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmCall {
    Respond { subject: String, body: String },
    Sendable { draft: String, summary: Option<String> },
    Compose { summary: Option<String>, feedback: Option<(String, String)> },
    Summarize { messages: Vec<ThreadMessage> },
}

/// Deterministic capabilities: RESPOND unless the subject contains "sale",
/// drafts numbered from 0, verdicts taken from a script (SENDABLE when exhausted).
pub struct CountingLlm {
    pub verdicts: Mutex<VecDeque<(SendableLabel, String)>>,
    pub fail_compose_at: Option<usize>,
    pub calls: Mutex<Vec<LlmCall>>,
}

impl CountingLlm {
    pub fn new() -> Arc<Self> {
        Self::with_verdicts(Vec::new())
    }

    pub fn with_verdicts(verdicts: Vec<(SendableLabel, &str)>) -> Arc<Self> {
        Arc::new(Self {
            verdicts: Mutex::new(
                verdicts
                    .into_iter()
                    .map(|(label, reason)| (label, reason.to_string()))
                    .collect(),
            ),
            fail_compose_at: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<LlmCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn compose_calls(&self) -> Vec<LlmCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, LlmCall::Compose { .. }))
            .collect()
    }

    pub fn count(&self, pred: fn(&LlmCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }
}

pub fn is_respond(c: &LlmCall) -> bool {
    matches!(c, LlmCall::Respond { .. })
}
pub fn is_sendable(c: &LlmCall) -> bool {
    matches!(c, LlmCall::Sendable { .. })
}
pub fn is_compose(c: &LlmCall) -> bool {
    matches!(c, LlmCall::Compose { .. })
}
pub fn is_summarize(c: &LlmCall) -> bool {
    matches!(c, LlmCall::Summarize { .. })
}

#[async_trait]
impl LanguageCapabilities for CountingLlm {
    async fn classify_respond(&self, subject: &str, body: &str) -> Result<RespondLabel, LlmError> {
        self.calls.lock().unwrap().push(LlmCall::Respond {
            subject: subject.into(),
            body: body.into(),
        });
        if subject.to_lowercase().contains("sale") {
            Ok(RespondLabel::Skip)
        } else {
            Ok(RespondLabel::Respond)
        }
    }

    async fn classify_sendable(
        &self,
        _subject: &str,
        _body: &str,
        draft: &str,
        summary: Option<&str>,
    ) -> Result<SendableJudgement, LlmError> {
        self.calls.lock().unwrap().push(LlmCall::Sendable {
            draft: draft.into(),
            summary: summary.map(str::to_string),
        });
        let (label, reason) = self
            .verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((SendableLabel::Sendable, "Looks good".into()));
        Ok(SendableJudgement {
            label,
            reason: Some(reason),
        })
    }

    async fn compose_reply(&self, request: ComposeRequest<'_>) -> Result<String, LlmError> {
        let mut calls = self.calls.lock().unwrap();
        let n = calls.iter().filter(|c| is_compose(c)).count();
        calls.push(LlmCall::Compose {
            summary: request.summary.map(str::to_string),
            feedback: request
                .feedback
                .map(|(d, r)| (d.to_string(), r.to_string())),
        });
        if self.fail_compose_at == Some(n) {
            return Err(stub_error("compose unavailable"));
        }
        Ok(format!("draft-{n}"))
    }

    async fn summarize_thread(&self, messages: &[ThreadMessage]) -> Result<Option<String>, LlmError> {
        self.calls.lock().unwrap().push(LlmCall::Summarize {
            messages: messages.to_vec(),
        });
        Ok(Some(format!("{} earlier messages", messages.len())))
    }
}

// ── Mailbox ─────────────────────────────────────────────────────────

/// In-memory mailbox holding messages by id and recording every call by name.
#[derive(Default)]
pub struct FakeMailbox {
    pub messages: Vec<MailMessage>,
    pub calls: Mutex<Vec<String>>,
    pub drafts: Mutex<Vec<(String, String)>>,
}

impl FakeMailbox {
    pub fn with_messages(messages: Vec<MailMessage>) -> Arc<Self> {
        Arc::new(Self {
            messages,
            ..Default::default()
        })
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MailboxGateway for FakeMailbox {
    async fn fetch_message(
        &self,
        id: &str,
        _fields: &[&str],
    ) -> Result<Option<MailMessage>, MailboxError> {
        self.calls.lock().unwrap().push("fetch_message".into());
        Ok(self.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn fetch_conversation(
        &self,
        conversation_id: &str,
        _fields: &[&str],
    ) -> Result<Vec<MailMessage>, MailboxError> {
        self.calls.lock().unwrap().push("fetch_conversation".into());
        Ok(self
            .messages
            .iter()
            .filter(|m| m.conversation_id.as_deref() == Some(conversation_id))
            .cloned()
            .collect())
    }

    async fn create_reply_draft(&self, message_id: &str) -> Result<DraftRef, MailboxError> {
        self.calls.lock().unwrap().push("create_reply_draft".into());
        Ok(DraftRef {
            id: Some(format!("draft-for-{message_id}")),
        })
    }

    async fn update_draft_body(
        &self,
        draft_id: &str,
        content: &str,
    ) -> Result<DraftRef, MailboxError> {
        self.calls.lock().unwrap().push("update_draft_body".into());
        self.drafts
            .lock()
            .unwrap()
            .push((draft_id.to_string(), content.to_string()));
        Ok(DraftRef {
            id: Some(draft_id.to_string()),
        })
    }
}

pub fn workflow(
    mailbox: &Arc<FakeMailbox>,
    llm: &Arc<CountingLlm>,
    max_redraft_tries: u32,
) -> Arc<DraftWorkflow> {
    Arc::new(DraftWorkflow::new(
        mailbox.clone(),
        llm.clone(),
        Arc::new(HtmlSanitizer),
        &WorkflowConfig { max_redraft_tries },
    ))
}
