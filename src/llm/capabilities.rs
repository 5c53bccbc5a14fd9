//! Language capabilities — the four model-backed operations the workflow uses.
//!
//! The workflow depends on [`LanguageCapabilities`] only; [`LlmCapabilities`]
//! is the production implementation over any [`LlmProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::prompts;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::types::ThreadMessage;

/// Temperature for the classifiers.
const CLASSIFY_TEMPERATURE: f32 = 0.0;

/// Temperature for drafting and summarizing.
const GENERATE_TEMPERATURE: f32 = 0.4;

const CLASSIFY_MAX_TOKENS: u32 = 256;
const COMPOSE_MAX_TOKENS: u32 = 1024;
const SUMMARIZE_MAX_TOKENS: u32 = 512;

/// Output of the respond/skip classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RespondLabel {
    Respond,
    Skip,
}

impl RespondLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Respond => "RESPOND",
            Self::Skip => "SKIP",
        }
    }
}

/// Output label of the sendable/skip proofreader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendableLabel {
    Sendable,
    Skip,
}

/// Proofreader judgement: label plus the model's justification, if it gave one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendableJudgement {
    pub label: SendableLabel,
    pub reason: Option<String>,
}

/// Input to the reply composer.
#[derive(Debug, Clone, Copy)]
pub struct ComposeRequest<'a> {
    pub subject: &'a str,
    pub body: &'a str,
    pub sender: &'a str,
    pub summary: Option<&'a str>,
    /// Previous rejected draft and its rejection reason.
    pub feedback: Option<(&'a str, &'a str)>,
}

/// The four language capabilities.
#[async_trait]
pub trait LanguageCapabilities: Send + Sync {
    /// Decide whether an email warrants a reply.
    async fn classify_respond(&self, subject: &str, body: &str) -> Result<RespondLabel, LlmError>;

    /// Judge whether a draft reply is good enough to keep.
    async fn classify_sendable(
        &self,
        subject: &str,
        body: &str,
        draft: &str,
        summary: Option<&str>,
    ) -> Result<SendableJudgement, LlmError>;

    /// Write a reply body.
    async fn compose_reply(&self, request: ComposeRequest<'_>) -> Result<String, LlmError>;

    /// Condense thread messages into a summary. `None` when the model returns nothing.
    async fn summarize_thread(&self, messages: &[ThreadMessage]) -> Result<Option<String>, LlmError>;
}

/// [`LanguageCapabilities`] backed by a chat-completion provider.
pub struct LlmCapabilities {
    llm: Arc<dyn LlmProvider>,
}

impl LlmCapabilities {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let response = self.llm.complete(request).await?;
        debug!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Completion finished"
        );
        Ok(response.content)
    }
}

#[async_trait]
impl LanguageCapabilities for LlmCapabilities {
    async fn classify_respond(&self, subject: &str, body: &str) -> Result<RespondLabel, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::RESPOND_SYSTEM_PROMPT),
            ChatMessage::user(prompts::respond_user_prompt(subject, body)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let raw = self.complete(request).await?;
        let parsed: LabelResponse<RespondLabel> = parse_label(self.llm.model_name(), &raw)?;
        Ok(parsed.classification)
    }

    async fn classify_sendable(
        &self,
        subject: &str,
        body: &str,
        draft: &str,
        summary: Option<&str>,
    ) -> Result<SendableJudgement, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::SENDABLE_SYSTEM_PROMPT),
            ChatMessage::user(prompts::sendable_user_prompt(subject, body, draft, summary)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let raw = self.complete(request).await?;
        let parsed: LabelResponse<SendableLabel> = parse_label(self.llm.model_name(), &raw)?;
        Ok(SendableJudgement {
            label: parsed.classification,
            reason: parsed.reason.filter(|r| !r.trim().is_empty()),
        })
    }

    async fn compose_reply(&self, request: ComposeRequest<'_>) -> Result<String, LlmError> {
        let completion = CompletionRequest::new(vec![
            ChatMessage::system(prompts::COMPOSE_SYSTEM_PROMPT),
            ChatMessage::user(prompts::compose_user_prompt(
                request.subject,
                request.body,
                request.sender,
                request.summary,
                request.feedback,
            )),
        ])
        .with_temperature(GENERATE_TEMPERATURE)
        .with_max_tokens(COMPOSE_MAX_TOKENS);

        Ok(self.complete(completion).await?.trim().to_string())
    }

    async fn summarize_thread(&self, messages: &[ThreadMessage]) -> Result<Option<String>, LlmError> {
        if messages.is_empty() {
            return Ok(None);
        }
        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::SUMMARIZE_SYSTEM_PROMPT),
            ChatMessage::user(prompts::summarize_user_prompt(messages)),
        ])
        .with_temperature(GENERATE_TEMPERATURE)
        .with_max_tokens(SUMMARIZE_MAX_TOKENS);

        let summary = self.complete(request).await?;
        let summary = summary.trim();
        Ok((!summary.is_empty()).then(|| summary.to_string()))
    }
}

// ── Response parsing ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LabelResponse<L> {
    classification: L,
    #[serde(default)]
    reason: Option<String>,
}

/// Parse a structured classification, tolerating markdown fences and a bare label.
fn parse_label<L>(provider: &str, raw: &str) -> Result<LabelResponse<L>, LlmError>
where
    L: for<'de> Deserialize<'de>,
{
    let json_str = extract_json_object(raw);
    if let Ok(parsed) = serde_json::from_str::<LabelResponse<L>>(&json_str) {
        return Ok(parsed);
    }

    // Some models ignore the format instruction and answer with the label alone.
    let bare = raw.trim().trim_matches(|c: char| c == '"' || c == '`' || c == '.');
    serde_json::from_value::<L>(serde_json::Value::String(bare.to_uppercase()))
        .map(|classification| LabelResponse {
            classification,
            reason: None,
        })
        .map_err(|_| {
            warn!(raw_response = %raw, "Unparseable classification response");
            LlmError::InvalidResponse {
                provider: provider.to_string(),
                reason: format!("unexpected classification output: {raw}"),
            }
        })
}

/// Extract a JSON object from LLM output that might contain markdown or extra text.
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}
