//! Anthropic Messages API client.
//!
//! Backs the chat-completion port used by chat turns, fix requests and code
//! analysis. Each request is a single attempt; non-success statuses are
//! mapped to user-facing messages.

mod client;
mod types;

pub use client::{AnthropicClient, ANTHROPIC_VERSION};
pub use types::{ApiError, ContentBlock, MessagesResponse, Usage};
