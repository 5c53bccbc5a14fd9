//! Reply-drafting workflow.
//!
//! Every new-message notification flows through:
//! 1. `ContextBuilder::build()`: fetch, sanitize, summarize the thread
//! 2. `ResponseGate::classify()`: RESPOND or SKIP
//! 3. `RedraftOrchestrator::run()`: compose ⇄ validate, bounded
//! 4. `DraftPersister::persist()`: create and fill the reply draft
//!
//! **Nothing is sent.** The only side effect is a draft left for review.

pub mod composer;
pub mod context_builder;
pub mod persister;
pub mod quality_gate;
pub mod redraft;
pub mod response_gate;
pub mod types;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use types::{InboundNotification, NotificationPayload, WorkflowOutcome};
pub use workflow::DraftWorkflow;
