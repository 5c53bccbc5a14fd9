//! Scripted stand-ins for the mailbox and the language capabilities.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{LlmError, MailboxError};
use crate::llm::{ComposeRequest, LanguageCapabilities, RespondLabel, SendableJudgement, SendableLabel};
use crate::mailbox::{DraftRef, MailMessage, MailboxGateway};
use crate::pipeline::types::{EmailRecord, ThreadMessage};

pub fn llm_error(reason: &str) -> LlmError {
    LlmError::RequestFailed {
        provider: "stub".into(),
        reason: reason.into(),
    }
}

pub fn message(id: &str, subject: &str, body: &str) -> MailMessage {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "subject": subject,
        "body": {"contentType": "html", "content": body},
        "conversationId": "conv-1",
        "sender": {"emailAddress": {"address": "alice@example.com"}},
        "toRecipients": [{"emailAddress": {"address": "me@example.com"}}],
    }))
    .unwrap()
}

pub fn record(subject: &str, body: &str) -> EmailRecord {
    EmailRecord {
        id: "m1".into(),
        raw_subject: subject.into(),
        raw_body: body.into(),
        clean_subject: subject.into(),
        clean_body: body.into(),
        conversation_id: None,
        internet_message_id: None,
        sender: "alice@example.com".into(),
        recipients: vec!["me@example.com".into()],
        received_at: None,
    }
}

// ── Language capabilities ───────────────────────────────────────────

/// Compose arguments captured per call.
#[derive(Debug, Clone)]
pub struct ComposeCall {
    pub subject: String,
    pub summary: Option<String>,
    pub feedback: Option<(String, String)>,
}

/// Language capabilities answering from queues. Exhausted queues fall back to
/// `Draft <n>` for compose and `SENDABLE` for validation.
pub struct ScriptedLlm {
    pub respond: Result<RespondLabel, String>,
    pub drafts: Mutex<VecDeque<Result<String, String>>>,
    pub verdicts: Mutex<VecDeque<Result<SendableJudgement, String>>>,
    pub summary: Result<Option<String>, String>,
    pub respond_calls: AtomicUsize,
    pub sendable_calls: AtomicUsize,
    pub compose_calls: Mutex<Vec<ComposeCall>>,
    pub summarize_calls: Mutex<Vec<Vec<ThreadMessage>>>,
}

impl Default for ScriptedLlm {
    fn default() -> Self {
        Self {
            respond: Ok(RespondLabel::Respond),
            drafts: Mutex::new(VecDeque::new()),
            verdicts: Mutex::new(VecDeque::new()),
            summary: Ok(Some("Thread summary".into())),
            respond_calls: AtomicUsize::new(0),
            sendable_calls: AtomicUsize::new(0),
            compose_calls: Mutex::new(Vec::new()),
            summarize_calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedLlm {
    pub fn with_verdicts(verdicts: Vec<Result<SendableJudgement, String>>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into()),
            ..Default::default()
        }
    }

    pub fn compose_count(&self) -> usize {
        self.compose_calls.lock().unwrap().len()
    }

    pub fn sendable_count(&self) -> usize {
        self.sendable_calls.load(Ordering::SeqCst)
    }
}

pub fn reject(reason: &str) -> Result<SendableJudgement, String> {
    Ok(SendableJudgement {
        label: SendableLabel::Skip,
        reason: Some(reason.into()),
    })
}

pub fn accept() -> Result<SendableJudgement, String> {
    Ok(SendableJudgement {
        label: SendableLabel::Sendable,
        reason: Some("Addresses the question".into()),
    })
}

#[async_trait]
impl LanguageCapabilities for ScriptedLlm {
    async fn classify_respond(&self, _subject: &str, _body: &str) -> Result<RespondLabel, LlmError> {
        self.respond_calls.fetch_add(1, Ordering::SeqCst);
        self.respond.clone().map_err(|e| llm_error(&e))
    }

    async fn classify_sendable(
        &self,
        _subject: &str,
        _body: &str,
        _draft: &str,
        _summary: Option<&str>,
    ) -> Result<SendableJudgement, LlmError> {
        self.sendable_calls.fetch_add(1, Ordering::SeqCst);
        match self.verdicts.lock().unwrap().pop_front() {
            Some(verdict) => verdict.map_err(|e| llm_error(&e)),
            None => accept().map_err(|e| llm_error(&e)),
        }
    }

    async fn compose_reply(&self, request: ComposeRequest<'_>) -> Result<String, LlmError> {
        let mut calls = self.compose_calls.lock().unwrap();
        calls.push(ComposeCall {
            subject: request.subject.to_string(),
            summary: request.summary.map(str::to_string),
            feedback: request
                .feedback
                .map(|(d, r)| (d.to_string(), r.to_string())),
        });
        let n = calls.len();
        match self.drafts.lock().unwrap().pop_front() {
            Some(draft) => draft.map_err(|e| llm_error(&e)),
            None => Ok(format!("Draft {n}")),
        }
    }

    async fn summarize_thread(&self, messages: &[ThreadMessage]) -> Result<Option<String>, LlmError> {
        self.summarize_calls.lock().unwrap().push(messages.to_vec());
        self.summary.clone().map_err(|e| llm_error(&e))
    }
}

// ── Mailbox ─────────────────────────────────────────────────────────

/// In-memory mailbox recording every call.
#[derive(Default)]
pub struct StubMailbox {
    pub message: Option<MailMessage>,
    pub fail_fetch: bool,
    pub thread: Vec<MailMessage>,
    pub fail_conversation: bool,
    pub draft_id: Option<String>,
    pub fail_create: bool,
    pub updated_id: Option<String>,
    pub calls: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<(String, String)>>,
}

impl StubMailbox {
    pub fn with_message(message: MailMessage) -> Self {
        Self {
            message: Some(message),
            draft_id: Some("draft-1".into()),
            updated_id: Some("draft-1".into()),
            ..Default::default()
        }
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    fn unavailable() -> MailboxError {
        MailboxError::Status {
            endpoint: "/stub".into(),
            status: 503,
            body: "unavailable".into(),
        }
    }
}

#[async_trait]
impl MailboxGateway for StubMailbox {
    async fn fetch_message(
        &self,
        _id: &str,
        _fields: &[&str],
    ) -> Result<Option<MailMessage>, MailboxError> {
        self.record("fetch_message");
        if self.fail_fetch {
            return Err(Self::unavailable());
        }
        Ok(self.message.clone())
    }

    async fn fetch_conversation(
        &self,
        _conversation_id: &str,
        _fields: &[&str],
    ) -> Result<Vec<MailMessage>, MailboxError> {
        self.record("fetch_conversation");
        if self.fail_conversation {
            return Err(Self::unavailable());
        }
        Ok(self.thread.clone())
    }

    async fn create_reply_draft(&self, _message_id: &str) -> Result<DraftRef, MailboxError> {
        self.record("create_reply_draft");
        if self.fail_create {
            return Err(Self::unavailable());
        }
        Ok(DraftRef {
            id: self.draft_id.clone(),
        })
    }

    async fn update_draft_body(
        &self,
        draft_id: &str,
        content: &str,
    ) -> Result<DraftRef, MailboxError> {
        self.record("update_draft_body");
        self.updates
            .lock()
            .unwrap()
            .push((draft_id.to_string(), content.to_string()));
        Ok(DraftRef {
            id: self.updated_id.clone(),
        })
    }
}
