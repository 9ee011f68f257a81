//! Lightweight lexical pass over script modules.
//!
//! The scanner does not build a syntax tree. It walks the source once,
//! skipping comments, string/template/regex literals and tracking
//! delimiter nesting, and reports:
//!
//! - byte offsets of top-level `import`/`export` keywords that start a line
//!   or follow a top-level `;`
//! - syntax errors it can prove (unterminated literals or comments,
//!   unbalanced delimiters)
//!
//! In JSX-capable sources, text between tags may contain apostrophes,
//! stray quotes or parentheses. There, a quote directly after a word is
//! not a literal, a quote or regex that runs into a line break is
//! abandoned and re-read as punctuation, and only braces must balance.
//! A backtick whose template never closes, or a `/*` with no `*/`, is
//! re-read as punctuation too.

use std::collections::{HashMap, HashSet};

use super::types::{Diagnostic, Location};

/// Result of scanning one module.
#[derive(Debug, Default)]
pub struct ScanOutput {
    /// Offsets of top-level `import`/`export` keywords, in source order.
    pub statements: Vec<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Brace(usize),
    Paren(usize),
    Bracket(usize),
    Template(usize),
    TemplateExpr(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    /// Identifier or keyword; `true` when a regex may follow it.
    Word(bool),
    /// End of an operand: literal, `)`, `]`, `}`.
    Value,
    Punct(u8),
}

const REGEX_KEYWORDS: [&str; 13] = [
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
];

/// Scanner state at the opening backtick of a template in JSX sources.
#[derive(Debug, Clone)]
struct Checkpoint {
    stack: Vec<Frame>,
    statements: usize,
    diagnostics: usize,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

struct Scanner<'a> {
    file: &'a str,
    text: &'a str,
    src: &'a [u8],
    jsx: bool,
    pos: usize,
    stack: Vec<Frame>,
    prev: Prev,
    token_on_line: bool,
    templates: HashMap<usize, Checkpoint>,
    plain_backticks: HashSet<usize>,
    out: ScanOutput,
}

/// Scan `source` (the contents of `file`).
pub fn scan(file: &str, source: &str, jsx: bool) -> ScanOutput {
    let mut scanner = Scanner {
        file,
        text: source,
        src: source.as_bytes(),
        jsx,
        pos: 0,
        stack: Vec::new(),
        prev: Prev::Start,
        token_on_line: false,
        templates: HashMap::new(),
        plain_backticks: HashSet::new(),
        out: ScanOutput::default(),
    };
    scanner.run();
    scanner.out
}

impl<'a> Scanner<'a> {
    fn peek(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn error(&mut self, message: impl Into<String>, offset: usize) {
        let location = Location::at(self.file, self.text, offset);
        self.out
            .diagnostics
            .push(Diagnostic::error(message, Some(location)));
    }

    fn in_template_text(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Template(_)))
    }

    fn run(&mut self) {
        if self.src.starts_with(b"#!") {
            while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
                self.pos += 1;
            }
        }

        loop {
            let finished = self.scan_to_end();
            if self.jsx && self.back_off_template() {
                continue;
            }
            if !finished {
                return;
            }
            break;
        }

        if let Some(frame) = self.stack.last().copied() {
            match frame {
                Frame::Template(start) => self.error("Unterminated template literal", start),
                Frame::Brace(start) | Frame::TemplateExpr(start) => {
                    self.error("Unclosed `{`", start)
                }
                Frame::Paren(start) => self.error("Unclosed `(`", start),
                Frame::Bracket(start) => self.error("Unclosed `[`", start),
            }
        }
    }

    /// Returns false when stopped by a fatal error.
    fn scan_to_end(&mut self) -> bool {
        while self.pos < self.src.len() {
            let ok = if self.in_template_text() {
                self.template_text()
            } else {
                self.code()
            };
            if !ok {
                return false;
            }
        }
        true
    }

    /// Rewind to the outermost template still open and re-read its backtick
    /// as punctuation. Returns false when no template is open.
    fn back_off_template(&mut self) -> bool {
        let Some(start) = self.stack.iter().find_map(|frame| match frame {
            Frame::Template(start) => Some(*start),
            _ => None,
        }) else {
            return false;
        };
        let Some(checkpoint) = self.templates.remove(&start) else {
            return false;
        };

        self.templates.retain(|&offset, _| offset < start);
        self.plain_backticks.insert(start);
        self.stack = checkpoint.stack;
        self.prev = Prev::Punct(b'`');
        self.token_on_line = true;
        self.out.statements.truncate(checkpoint.statements);
        self.out.diagnostics.truncate(checkpoint.diagnostics);
        self.pos = start + 1;
        true
    }

    /// One step in code context. Returns false after a fatal error.
    fn code(&mut self) -> bool {
        let start = self.pos;
        let b = self.src[start];

        match b {
            b'\n' => {
                self.token_on_line = false;
                self.pos += 1;
                return true;
            }
            b' ' | b'\t' | b'\r' | 0x0b | 0x0c => {
                self.pos += 1;
                return true;
            }
            b'/' if self.peek(1) == Some(b'/') => {
                while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
                    self.pos += 1;
                }
                return true;
            }
            b'/' if self.peek(1) == Some(b'*') => {
                return match self.text[start + 2..].find("*/") {
                    Some(end) => {
                        self.pos = start + 2 + end + 2;
                        true
                    }
                    None if self.jsx => {
                        self.pos += 1;
                        self.token_on_line = true;
                        self.prev = Prev::Punct(b'/');
                        true
                    }
                    None => {
                        self.error("Unterminated comment", start);
                        false
                    }
                };
            }
            _ => {}
        }

        let statement_start = !self.token_on_line || self.prev == Prev::Punct(b';');
        self.token_on_line = true;

        match b {
            b'\'' | b'"' => {
                let after_word = start > 0 && is_ident_byte(self.src[start - 1]);
                if self.jsx && after_word {
                    self.pos += 1;
                    self.prev = Prev::Punct(b);
                    return true;
                }
                self.string(b)
            }
            b'`' if self.plain_backticks.contains(&start) => {
                self.pos += 1;
                self.prev = Prev::Punct(b);
                true
            }
            b'`' => {
                if self.jsx {
                    self.templates.insert(
                        start,
                        Checkpoint {
                            stack: self.stack.clone(),
                            statements: self.out.statements.len(),
                            diagnostics: self.out.diagnostics.len(),
                        },
                    );
                }
                self.stack.push(Frame::Template(start));
                self.pos += 1;
                true
            }
            b'/' => {
                if self.regex_allowed() {
                    self.regex()
                } else {
                    self.pos += 1;
                    self.prev = Prev::Punct(b);
                    true
                }
            }
            b'{' => {
                self.stack.push(Frame::Brace(start));
                self.pos += 1;
                self.prev = Prev::Punct(b);
                true
            }
            b'}' => {
                self.pos += 1;
                match self.stack.last().copied() {
                    Some(Frame::TemplateExpr(_)) | Some(Frame::Brace(_)) => {
                        self.stack.pop();
                        self.prev = Prev::Value;
                        true
                    }
                    _ => {
                        self.error("Unexpected `}`", start);
                        false
                    }
                }
            }
            b'(' | b'[' => {
                if !self.jsx {
                    let frame = if b == b'(' {
                        Frame::Paren(start)
                    } else {
                        Frame::Bracket(start)
                    };
                    self.stack.push(frame);
                }
                self.pos += 1;
                self.prev = Prev::Punct(b);
                true
            }
            b')' | b']' => {
                self.pos += 1;
                self.prev = Prev::Value;
                if self.jsx {
                    return true;
                }
                let expected = if b == b')' {
                    matches!(self.stack.last(), Some(Frame::Paren(_)))
                } else {
                    matches!(self.stack.last(), Some(Frame::Bracket(_)))
                };
                if expected {
                    self.stack.pop();
                    true
                } else {
                    self.error(format!("Unexpected `{}`", b as char), start);
                    false
                }
            }
            b'0'..=b'9' => {
                while self.pos < self.src.len()
                    && (is_ident_byte(self.src[self.pos]) || self.src[self.pos] == b'.')
                {
                    self.pos += 1;
                }
                self.prev = Prev::Value;
                true
            }
            _ if is_ident_byte(b) => {
                while self.pos < self.src.len() && is_ident_byte(self.src[self.pos]) {
                    self.pos += 1;
                }
                let word = &self.text[start..self.pos];
                if statement_start && self.stack.is_empty() && self.is_module_keyword(word) {
                    self.out.statements.push(start);
                }
                self.prev = Prev::Word(REGEX_KEYWORDS.contains(&word) || word == "await");
                true
            }
            b'+' | b'-' if self.peek(1) == Some(b) => {
                self.pos += 2;
                // Postfix `x++` ends an operand; prefix `++x` does not.
                self.prev = match self.prev {
                    Prev::Value | Prev::Word(false) => Prev::Value,
                    _ => Prev::Punct(b),
                };
                true
            }
            _ => {
                self.pos += 1;
                self.prev = Prev::Punct(b);
                true
            }
        }
    }

    /// `import`/`export` as a statement keyword (not `import(` or `import.meta`).
    fn is_module_keyword(&self, word: &str) -> bool {
        match word {
            "export" => true,
            "import" => {
                let rest = self.text[self.pos..].trim_start();
                !(rest.starts_with('(') || rest.starts_with('.'))
            }
            _ => false,
        }
    }

    fn regex_allowed(&self) -> bool {
        match self.prev {
            Prev::Start => true,
            Prev::Word(keyword) => keyword,
            Prev::Value => false,
            Prev::Punct(b'<') => !self.jsx,
            Prev::Punct(_) => true,
        }
    }

    fn string(&mut self, quote: u8) -> bool {
        let start = self.pos;
        let mut i = start + 1;
        while i < self.src.len() {
            match self.src[i] {
                b'\\' => i += 2,
                b'\n' => break,
                c if c == quote => {
                    self.pos = i + 1;
                    self.prev = Prev::Value;
                    return true;
                }
                _ => i += 1,
            }
        }

        if self.jsx {
            self.pos = start + 1;
            self.prev = Prev::Punct(quote);
            return true;
        }
        self.error("Unterminated string literal", start);
        false
    }

    fn regex(&mut self) -> bool {
        let start = self.pos;
        let mut i = start + 1;
        let mut in_class = false;
        while i < self.src.len() {
            match self.src[i] {
                b'\\' => i += 2,
                b'\n' => break,
                b'[' => {
                    in_class = true;
                    i += 1;
                }
                b']' => {
                    in_class = false;
                    i += 1;
                }
                b'/' if !in_class => {
                    i += 1;
                    while i < self.src.len() && is_ident_byte(self.src[i]) {
                        i += 1;
                    }
                    self.pos = i;
                    self.prev = Prev::Value;
                    return true;
                }
                _ => i += 1,
            }
        }

        if self.jsx {
            self.pos = start + 1;
            self.prev = Prev::Punct(b'/');
            return true;
        }
        self.error("Unterminated regular expression", start);
        false
    }

    fn template_text(&mut self) -> bool {
        while self.pos < self.src.len() {
            match self.src[self.pos] {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.stack.pop();
                    self.pos += 1;
                    self.prev = Prev::Value;
                    return true;
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.stack.push(Frame::TemplateExpr(self.pos));
                    self.pos += 2;
                    self.prev = Prev::Punct(b'{');
                    return true;
                }
                b'\n' => {
                    self.token_on_line = true;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.src.len());
        true
    }
}
