//! Domain types shared across modules.
//!
//! This module contains data structures that are used by multiple
//! parts of the application (protocol parser, virtual file store,
//! bundler, orchestration loop). Keeping them here avoids circular
//! dependencies between those modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared language of a file in the virtual file map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ts,
    Tsx,
    Js,
    Jsx,
    Css,
    Json,
    Md,
    Html,
    Plaintext,
}

impl Language {
    /// Detect the language from a file path's extension.
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        let ext = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return Language::Plaintext,
        };

        match ext.as_str() {
            "ts" => Language::Ts,
            "tsx" => Language::Tsx,
            "js" => Language::Js,
            "jsx" => Language::Jsx,
            "css" => Language::Css,
            "json" => Language::Json,
            "md" => Language::Md,
            "html" => Language::Html,
            _ => Language::Plaintext,
        }
    }

    /// Short identifier used in logs and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ts => "ts",
            Language::Tsx => "tsx",
            Language::Js => "js",
            Language::Jsx => "jsx",
            Language::Css => "css",
            Language::Json => "json",
            Language::Md => "md",
            Language::Html => "html",
            Language::Plaintext => "plaintext",
        }
    }

    /// Whether files of this language are script modules the bundler links.
    pub fn is_script(&self) -> bool {
        matches!(
            self,
            Language::Ts | Language::Tsx | Language::Js | Language::Jsx
        )
    }
}

/// A single file mutation requested by an assistant response.
///
/// Produced by the protocol parser, consumed by the orchestration loop.
/// Operations are applied in the order they appeared in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum FileOperation {
    Create { path: String, content: String },
    Update { path: String, content: String },
    Delete { path: String },
}

impl FileOperation {
    /// The target path exactly as the assistant wrote it.
    pub fn path(&self) -> &str {
        match self {
            FileOperation::Create { path, .. }
            | FileOperation::Update { path, .. }
            | FileOperation::Delete { path } => path,
        }
    }

    /// Content carried by Create/Update operations.
    pub fn content(&self) -> Option<&str> {
        match self {
            FileOperation::Create { content, .. } | FileOperation::Update { content, .. } => {
                Some(content)
            }
            FileOperation::Delete { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FileOperation::Create { .. } => "create",
            FileOperation::Update { .. } => "update",
            FileOperation::Delete { .. } => "delete",
        }
    }
}

/// Structured result of parsing one assistant response.
///
/// Ephemeral: lives for the duration of one AI turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResponse {
    /// Text shown to the user, with code fences and tool blocks removed.
    pub display_text: String,
    /// File operations in source order.
    pub file_operations: Vec<FileOperation>,
    /// Terminal commands in source order.
    pub terminal_commands: Vec<String>,
    /// First code-language fenced block, trimmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_code: Option<String>,
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of the conversation with the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}
