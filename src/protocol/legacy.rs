//! Single-object JSON operations from the older response format.
//!
//! `{"action": "create", "fileName": "src/a.ts", "content": "..."}` or
//! `{"action": "delete", "fileName": "src/a.ts"}`. Only the first object
//! shaped like this is considered.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::warn;

use crate::domain::FileOperation;

fn legacy_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{\s*"action"\s*:\s*"(?:create|delete)""#)
            .expect("legacy operation pattern is valid")
    })
}

#[derive(Debug, Deserialize)]
struct LegacyOperation {
    action: String,
    #[serde(alias = "fileName", alias = "filename")]
    path: String,
    #[serde(default)]
    content: Option<String>,
}

/// Find and decode the legacy JSON operation, returning it with the byte
/// offset where it starts.
///
/// Decoding failures are logged and yield `None`; they never affect the
/// tag-based operations in the same response.
pub fn find_operation(text: &str) -> Option<(usize, FileOperation)> {
    let start = legacy_start().find(text)?.start();

    let mut stream =
        serde_json::Deserializer::from_str(&text[start..]).into_iter::<LegacyOperation>();
    let raw = match stream.next() {
        Some(Ok(raw)) => raw,
        Some(Err(e)) => {
            warn!("Failed to parse JSON file operation: {}", e);
            return None;
        }
        None => return None,
    };

    let path = raw.path.trim().to_string();
    if path.is_empty() {
        warn!("Ignoring JSON file operation without a path");
        return None;
    }

    let op = match raw.action.as_str() {
        "create" => {
            let content = raw.content.unwrap_or_default();
            if content.trim().is_empty() {
                warn!("Ignoring JSON create for {} without content", path);
                return None;
            }
            FileOperation::Create { path, content }
        }
        "delete" => FileOperation::Delete { path },
        other => {
            warn!("Ignoring JSON file operation with action {:?}", other);
            return None;
        }
    };

    Some((start, op))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_with_file_name_key() {
        let text = r#"Here you go: {"action": "create", "fileName": "src/a.ts", "content": "export const a = { b: 1 }"} done"#;
        let (offset, op) = find_operation(text).unwrap();
        assert_eq!(offset, 13);
        assert_eq!(
            op,
            FileOperation::Create {
                path: "src/a.ts".to_string(),
                content: "export const a = { b: 1 }".to_string()
            }
        );
    }

    #[test]
    fn test_delete() {
        let text = r#"{ "action" : "delete", "path": "/src/old.tsx" }"#;
        let (_, op) = find_operation(text).unwrap();
        assert_eq!(
            op,
            FileOperation::Delete {
                path: "/src/old.tsx".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_json_is_ignored() {
        assert!(find_operation(r#"{"action": "create", "fileName": oops}"#).is_none());
        assert!(find_operation(r#"{"action": "rename", "fileName": "a"}"#).is_none());
        assert!(find_operation(r#"{"action": "create", "fileName": "a.ts"}"#).is_none());
    }
}
