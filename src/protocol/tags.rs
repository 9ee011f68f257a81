//! Matcher for the closed set of tool-call tags.
//!
//! Every block kind is scanned independently over the whole response.
//! A block only matches when it is well formed: the path/command field
//! sits on one line, fields are separated by whitespace only, and the
//! closing tag appears before any other opening tag of the same kind.
//! Anything else is left unmatched.

/// Tag kinds recognized in assistant responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Wrapper the assistant may put around a group of tool calls.
    ToolUse,
    CreateFile,
    UpdateFile,
    DeleteFile,
    ExecuteCommand,
}

impl TagKind {
    /// Removal order used when deriving display text.
    pub const STRIP_ORDER: [TagKind; 5] = [
        TagKind::ToolUse,
        TagKind::CreateFile,
        TagKind::UpdateFile,
        TagKind::DeleteFile,
        TagKind::ExecuteCommand,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TagKind::ToolUse => "tool_use",
            TagKind::CreateFile => "create_file",
            TagKind::UpdateFile => "update_file",
            TagKind::DeleteFile => "delete_file",
            TagKind::ExecuteCommand => "execute_command",
        }
    }

    pub fn open(&self) -> String {
        format!("<{}>", self.name())
    }

    pub fn close(&self) -> String {
        format!("</{}>", self.name())
    }
}

/// One matched tool-call block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagBlock<'a> {
    pub kind: TagKind,
    /// Byte offset of the opening tag in the response.
    pub start: usize,
    /// Byte offset just past the closing tag.
    pub end: usize,
    /// `<path>` or `<command>` text, untrimmed.
    pub field: &'a str,
    /// `<content>` text for create/update blocks, untrimmed.
    pub content: Option<&'a str>,
}

/// Cursor over the response text starting at a byte offset.
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// `<name>TEXT</name>` where TEXT contains no line break.
    fn single_line_field(&mut self, name: &str) -> Option<&'a str> {
        if !self.eat(&format!("<{}>", name)) {
            return None;
        }
        let close = format!("</{}>", name);
        let rest = self.rest();
        let end = rest.find(&close)?;
        let value = &rest[..end];
        if value.contains('\n') || value.contains('\r') {
            return None;
        }
        self.pos += end + close.len();
        Some(value)
    }

    /// `<content>TEXT</content>` followed by optional whitespace and the
    /// block's closing tag. The shortest such TEXT wins; a new opening tag of
    /// the same kind ends the search.
    fn content_until(&mut self, kind: TagKind) -> Option<&'a str> {
        if !self.eat("<content>") {
            return None;
        }
        let rest = self.rest();
        let close = kind.close();
        let limit = rest.find(&kind.open()).unwrap_or(rest.len());

        let mut search = 0;
        while let Some(found) = rest[search..limit].find("</content>") {
            let content_end = search + found;
            let after = &rest[content_end + "</content>".len()..];
            let trimmed = after.trim_start();
            if trimmed.starts_with(&close) {
                let consumed = rest.len() - trimmed.len();
                self.pos += consumed;
                return Some(&rest[..content_end]);
            }
            search = content_end + "</content>".len();
        }
        None
    }
}

/// Try to match a complete block of `kind` whose opening tag starts at `start`.
fn match_at(text: &str, kind: TagKind, start: usize) -> Option<TagBlock<'_>> {
    let mut cursor = Cursor {
        text,
        pos: start + kind.open().len(),
    };
    cursor.skip_whitespace();

    let (field, content) = match kind {
        TagKind::CreateFile | TagKind::UpdateFile => {
            let path = cursor.single_line_field("path")?;
            cursor.skip_whitespace();
            let content = cursor.content_until(kind)?;
            (path, Some(content))
        }
        TagKind::DeleteFile => (cursor.single_line_field("path")?, None),
        TagKind::ExecuteCommand => (cursor.single_line_field("command")?, None),
        TagKind::ToolUse => return None,
    };

    cursor.skip_whitespace();
    if !cursor.eat(&kind.close()) {
        return None;
    }

    Some(TagBlock {
        kind,
        start,
        end: cursor.pos,
        field,
        content,
    })
}

/// All well-formed blocks of one kind, in source order.
pub fn scan(text: &str, kind: TagKind) -> Vec<TagBlock<'_>> {
    let open = kind.open();
    let mut blocks = Vec::new();
    let mut from = 0;

    while let Some(found) = text[from..].find(&open) {
        let start = from + found;
        match match_at(text, kind, start) {
            Some(block) => {
                from = block.end;
                blocks.push(block);
            }
            None => from = start + open.len(),
        }
    }

    blocks
}

/// Remove every `<tag>...</tag>` span of one kind, pairing each opening tag
/// with the nearest closing tag after it. Unterminated openings are kept.
pub fn strip(text: &str, kind: TagKind) -> String {
    let open = kind.open();
    let close = kind.close();
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(&open) {
        let after_open = &rest[start + open.len()..];
        match after_open.find(&close) {
            Some(end) => {
                out.push_str(&rest[..start]);
                rest = &after_open[end + close.len()..];
            }
            None => break,
        }
    }

    out.push_str(rest);
    out
}
