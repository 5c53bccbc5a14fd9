//! Mail Drafter — drafts replies to newly arrived mail and leaves them for review.

pub mod config;
pub mod error;
pub mod llm;
pub mod mailbox;
pub mod pipeline;
pub mod sanitize;
pub mod server;
