//! Bridges rig's `CompletionModel` to [`LlmProvider`].
//!
//! System messages become the preamble, the last user message becomes the
//! prompt and everything in between is passed as chat history.

use async_trait::async_trait;
use rig::completion::{CompletionError, CompletionModel};
use rig::message::{AssistantContent, Message};
use tracing::debug;

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};

/// [`LlmProvider`] over any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let turns = split_messages(request.messages).ok_or_else(|| LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: "request has no user message".into(),
        })?;

        let mut builder = self
            .model
            .completion_request(Message::user(turns.prompt))
            .messages(turns.history);
        if let Some(preamble) = turns.preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        debug!(model = %self.model_name, "Sending completion request");
        let response = self
            .model
            .completion(builder.build())
            .await
            .map_err(|e| map_error(&self.model_name, e))?;

        let content = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            content,
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        })
    }
}

fn map_error(model: &str, err: CompletionError) -> LlmError {
    match err {
        CompletionError::ResponseError(reason) => LlmError::InvalidResponse {
            provider: model.to_string(),
            reason,
        },
        other => LlmError::RequestFailed {
            provider: model.to_string(),
            reason: other.to_string(),
        },
    }
}

/// A chat split the way rig's request builder wants it.
#[derive(Debug)]
struct Turns {
    preamble: Option<String>,
    history: Vec<Message>,
    prompt: String,
}

/// `None` when there is no user message to use as the prompt.
fn split_messages(messages: Vec<ChatMessage>) -> Option<Turns> {
    let prompt_at = messages.iter().rposition(|m| m.role == Role::User)?;

    let mut system = Vec::new();
    let mut history = Vec::new();
    let mut prompt = String::new();
    for (i, message) in messages.into_iter().enumerate() {
        match message.role {
            Role::System => system.push(message.content),
            Role::User if i == prompt_at => prompt = message.content,
            Role::User => history.push(Message::user(message.content)),
            Role::Assistant => history.push(Message::assistant(message.content)),
        }
    }

    Some(Turns {
        preamble: (!system.is_empty()).then(|| system.join("\n\n")),
        history,
        prompt,
    })
}
