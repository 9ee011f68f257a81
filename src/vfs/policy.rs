//! Guard rails for assistant-requested file operations.

use serde::{Deserialize, Serialize};

use crate::domain::FileOperation;

use super::paths::extension;

/// Limits applied to one batch of assistant file operations.
///
/// Disabled unless `enforce` is set; the defaults describe the limits the
/// system prompt asks the assistant to respect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperationPolicy {
    pub enforce: bool,
    pub max_operations_per_response: usize,
    /// Maximum content size in characters.
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
    /// Paths (relative to the project root) the assistant may not touch.
    pub restricted_paths: Vec<String>,
}

impl Default for OperationPolicy {
    fn default() -> Self {
        Self {
            enforce: false,
            max_operations_per_response: 5,
            max_file_size: 50_000,
            allowed_extensions: [".ts", ".tsx", ".js", ".jsx", ".css", ".json", ".md"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            restricted_paths: [
                "package.json",
                "package-lock.json",
                "tsconfig.json",
                ".env",
                ".gitignore",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl OperationPolicy {
    /// Check an operation at position `index` of its batch.
    ///
    /// Returns the reason for rejecting it, or `None` if it may be applied.
    pub fn check(&self, index: usize, op: &FileOperation) -> Option<String> {
        if !self.enforce {
            return None;
        }

        if index >= self.max_operations_per_response {
            return Some(format!(
                "exceeds the limit of {} operations per response",
                self.max_operations_per_response
            ));
        }

        let relative = op.path().trim().trim_start_matches('/');
        if self.restricted_paths.iter().any(|p| p == relative) {
            return Some(format!("{} is a restricted path", relative));
        }

        if let Some(content) = op.content() {
            let size = content.chars().count();
            if size > self.max_file_size {
                return Some(format!(
                    "content is {} characters, limit is {}",
                    size, self.max_file_size
                ));
            }

            let allowed = extension(relative)
                .map(|ext| {
                    self.allowed_extensions
                        .iter()
                        .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(&ext))
                })
                .unwrap_or(false);
            if !allowed {
                return Some(format!("{} has a disallowed extension", relative));
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(path: &str, content: &str) -> FileOperation {
        FileOperation::Create {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_policy_disabled_allows_everything() {
        let policy = OperationPolicy::default();
        assert_eq!(policy.check(99, &create("package.json", "{}")), None);
    }

    #[test]
    fn test_policy_enforced() {
        let policy = OperationPolicy {
            enforce: true,
            ..OperationPolicy::default()
        };
        assert_eq!(policy.check(0, &create("src/a.ts", "x")), None);
        assert!(policy.check(0, &create("/package.json", "{}")).is_some());
        assert!(policy.check(0, &create("src/run.sh", "ls")).is_some());
        assert!(policy.check(5, &create("src/a.ts", "x")).is_some());
        assert!(policy
            .check(0, &create("src/big.ts", &"x".repeat(50_001)))
            .is_some());
        assert_eq!(
            policy.check(
                0,
                &FileOperation::Delete {
                    path: "src/old.bin".to_string()
                }
            ),
            None
        );
    }
}
