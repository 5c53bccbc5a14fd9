//! Error types for Mail Drafter.

use std::fmt;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Mailbox gateway errors (REST plumbing and token acquisition).
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("Token acquisition failed: {0}")]
    Token(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Stage of the drafting workflow an error or outcome is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Classify,
    Compose,
    Validate,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Classify => "classify",
            Self::Compose => "compose",
            Self::Validate => "validate",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drafting workflow errors.
///
/// `Classification` and `Validation` never abort an invocation; they are
/// converted into a skip or a rejection where they occur. The rest are fatal.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Fetch failed for {message_id}: {reason}")]
    Fetch { message_id: String, reason: String },

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Composition failed: {0}")]
    Composition(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Persist failed for {message_id}: {reason}")]
    Persist { message_id: String, reason: String },
}

impl PipelineError {
    /// Workflow stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Fetch { .. } => Stage::Fetch,
            Self::Classification(_) => Stage::Classify,
            Self::Composition(_) => Stage::Compose,
            Self::Validation(_) => Stage::Validate,
            Self::Persist { .. } => Stage::Persist,
        }
    }
}
