//! Response parser.

use tracing::{debug, warn};

use crate::domain::{FileOperation, ParsedResponse};
use crate::vfs::paths::normalize;

use super::display::{display_text, suggested_code};
use super::heuristics::{is_code_path, looks_like_non_code};
use super::legacy;
use super::tags::{scan, TagBlock, TagKind};

const PREVIEW_CHARS: usize = 100;

/// Parses assistant responses into structured intents.
///
/// The only state is the path of the file currently open in the editor,
/// used by the second content gate on Update operations.
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    active_file: Option<String>,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_active_file(active_file: Option<&str>) -> Self {
        Self {
            active_file: active_file.and_then(|p| normalize(p).ok()),
        }
    }

    /// Parse one response. Never fails: malformed blocks are skipped.
    pub fn parse(&self, raw: &str) -> ParsedResponse {
        let mut located: Vec<(usize, FileOperation)> = Vec::new();

        if let Some((offset, op)) = legacy::find_operation(raw) {
            if self.accept(&op) {
                located.push((offset, op));
            }
        }

        for kind in [TagKind::CreateFile, TagKind::UpdateFile, TagKind::DeleteFile] {
            for block in scan(raw, kind) {
                if let Some(op) = self.operation_from_block(&block) {
                    located.push((block.start, op));
                }
            }
        }

        // Stable sort keeps kinds scanned earlier first on equal offsets.
        located.sort_by_key(|(offset, _)| *offset);
        let file_operations: Vec<FileOperation> = located.into_iter().map(|(_, op)| op).collect();

        let terminal_commands: Vec<String> = scan(raw, TagKind::ExecuteCommand)
            .into_iter()
            .filter_map(|block| {
                let command = block.field.trim();
                if command.is_empty() {
                    debug!("Skipping empty terminal command");
                    None
                } else {
                    Some(command.to_string())
                }
            })
            .collect();

        debug!(
            "Parsed response: {} file operation(s), {} command(s)",
            file_operations.len(),
            terminal_commands.len()
        );

        ParsedResponse {
            display_text: display_text(raw),
            file_operations,
            terminal_commands,
            suggested_code: suggested_code(raw),
        }
    }

    fn operation_from_block(&self, block: &TagBlock<'_>) -> Option<FileOperation> {
        let path = block.field.trim().to_string();
        if path.is_empty() {
            warn!("Skipping {} block without a path", block.kind.name());
            return None;
        }

        let op = match block.kind {
            TagKind::DeleteFile => FileOperation::Delete { path },
            TagKind::CreateFile | TagKind::UpdateFile => {
                let content = block.content.unwrap_or_default().trim().to_string();
                if content.is_empty() {
                    warn!("Skipping {} of {} with empty content", block.kind.name(), path);
                    return None;
                }
                if block.kind == TagKind::CreateFile {
                    FileOperation::Create { path, content }
                } else {
                    FileOperation::Update { path, content }
                }
            }
            TagKind::ExecuteCommand | TagKind::ToolUse => return None,
        };

        if self.accept(&op) {
            Some(op)
        } else {
            None
        }
    }

    /// Content gates for Create/Update operations.
    fn accept(&self, op: &FileOperation) -> bool {
        let Some(content) = op.content() else {
            return true;
        };
        if !looks_like_non_code(content) {
            return true;
        }

        let path = op.path();
        if is_code_path(path) {
            warn!(
                "Skipping {}: non-code content for code file {} ({}...)",
                op.kind(),
                path,
                preview(content)
            );
            return false;
        }

        if matches!(op, FileOperation::Update { .. }) && self.is_active_file(path) {
            warn!(
                "Skipping update: documentation-like content for the open file {} ({}...)",
                path,
                preview(content)
            );
            return false;
        }

        true
    }

    fn is_active_file(&self, path: &str) -> bool {
        match (&self.active_file, normalize(path)) {
            (Some(active), Ok(path)) => *active == path,
            _ => false,
        }
    }
}

fn preview(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}

/// Parse a response with no file open in the editor.
pub fn parse(raw: &str) -> ParsedResponse {
    ResponseParser::new().parse(raw)
}
