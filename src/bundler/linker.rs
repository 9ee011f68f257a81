//! Rewrites ES module syntax into registry calls.
//!
//! Every top-level `import`/`export` statement found by the scanner is
//! replaced in place:
//!
//! ```text
//! import App from './App'          var App = __importDefault(require("/src/App.tsx"));
//! import { a as b } from 'x'       var __i0 = require("npm-stub:x"), b = __i0.a;
//! export const x = 1               const x = 1
//! export default App               var __default = App
//! export * from './y'              __exportStar(exports, require("/src/y.ts"));
//! ```
//!
//! Exported bindings are registered as live getters by one `__export`
//! call prepended to the first line. Replacements never add line breaks and
//! pad with the line breaks they removed, so line numbers in the sandbox
//! match the virtual file.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::emit::js_string;
use super::resolver::ModuleResolver;
use super::types::{Diagnostic, Location, ResolutionRequest, ResolutionResult};

const IDENT: &str = r"[A-Za-z_$][\w$]*";

/// A module after rewriting.
#[derive(Debug, Default)]
pub struct LinkedSource {
    pub code: String,
    /// Resolved imports in first-seen order, without duplicates.
    pub dependencies: Vec<ResolutionResult>,
    pub diagnostics: Vec<Diagnostic>,
}

struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("module statement pattern is valid"))
}

fn import_bare() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r#"\Aimport\s*(?:"([^"\n]*)"|'([^'\n]*)')[ \t]*;?"#)
}

fn import_from() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(
        &RE,
        r#"\Aimport\s+(type\s+)?([^;'"]*?)\s*\bfrom\s*(?:"([^"\n]*)"|'([^'\n]*)')[ \t]*;?"#,
    )
}

fn export_type_only() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(
        &RE,
        r#"\Aexport\s+type\s*(?:\{[^}]*\}|\*(?:\s*as\s+[A-Za-z_$][\w$]*)?)(?:\s*from\s*(?:"[^"\n]*"|'[^'\n]*'))?[ \t]*;?"#,
    )
}

fn export_star() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(
        &RE,
        r#"\Aexport\s*\*\s*(?:as\s+([A-Za-z_$][\w$]*)\s*)?from\s*(?:"([^"\n]*)"|'([^'\n]*)')[ \t]*;?"#,
    )
}

fn export_list() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(
        &RE,
        r#"\Aexport\s*\{([^}]*)\}(?:\s*from\s*(?:"([^"\n]*)"|'([^'\n]*)'))?[ \t]*;?"#,
    )
}

fn export_default_function() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(
        &RE,
        r"\Aexport\s+default\s+((?:async\s+)?function\b(?:\s*\*)?)\s*([A-Za-z_$][\w$]*)?",
    )
}

fn export_default_class() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(
        &RE,
        r"\Aexport\s+default\s+((?:abstract\s+)?class)\b(?:\s+([A-Za-z_$][\w$]*))?",
    )
}

fn export_default_type() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"\Aexport\s+default\s+interface\b")
}

fn export_default_expr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"\Aexport\s+default\b\s*")
}

fn export_declaration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(
        &RE,
        r"\Aexport\s+(declare\s+)?((?:async\s+)?function\b(?:\s*\*)?|(?:abstract\s+)?class\b|(?:const\s+)?enum\b|const\b|let\b|var\b|type\b|interface\b|namespace\b|module\b)\s*",
    )
}

fn ident() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, &format!(r"\A{}", IDENT))
}

fn is_ident(text: &str) -> bool {
    ident().find(text).map(|m| m.end() == text.len()).unwrap_or(false)
}

/// `"x"` or `'x'` capture pair to the specifier text.
fn specifier<'t>(caps: &Captures<'t>, double: usize, single: usize) -> Option<&'t str> {
    caps.get(double).or_else(|| caps.get(single)).map(|m| m.as_str())
}

/// Replacement padded with the line breaks of the text it replaces.
fn padded(replacement: String, original: &str) -> String {
    let breaks = original.matches('\n').count();
    let mut out = replacement;
    out.push_str(&"\n".repeat(breaks));
    out
}

struct Linker<'a> {
    path: &'a str,
    source: &'a str,
    resolver: &'a ModuleResolver<'a>,
    edits: Vec<Edit>,
    exports: Vec<(String, String)>,
    out: LinkedSource,
    temp: usize,
}

/// Rewrite `source` (the contents of `path`) using the statement offsets
/// reported by the scanner.
pub fn link(
    path: &str,
    source: &str,
    statements: &[usize],
    resolver: &ModuleResolver<'_>,
) -> LinkedSource {
    let mut linker = Linker {
        path,
        source,
        resolver,
        edits: Vec::new(),
        exports: Vec::new(),
        out: LinkedSource::default(),
        temp: 0,
    };

    for &offset in statements {
        if source[offset..].starts_with("import") {
            linker.import(offset);
        } else {
            linker.export(offset);
        }
    }

    linker.finish()
}

impl<'a> Linker<'a> {
    fn error(&mut self, message: impl Into<String>, offset: usize) {
        let location = Location::at(self.path, self.source, offset);
        self.out
            .diagnostics
            .push(Diagnostic::error(message, Some(location)));
    }

    fn edit(&mut self, start: usize, end: usize, replacement: String) {
        let replacement = padded(replacement, &self.source[start..end]);
        self.edits.push(Edit {
            start,
            end,
            replacement,
        });
    }

    fn next_temp(&mut self, prefix: &str) -> String {
        let name = format!("{}{}", prefix, self.temp);
        self.temp += 1;
        name
    }

    /// Resolve a specifier and return the JS literal of its module id.
    fn require_id(&mut self, spec: &str) -> String {
        let resolved = self
            .resolver
            .resolve(&ResolutionRequest::new(spec, self.path));
        let id = js_string(&resolved.module_id());
        if !self.out.dependencies.contains(&resolved) {
            self.out.dependencies.push(resolved);
        }
        id
    }

    fn import(&mut self, offset: usize) {
        let text = &self.source[offset..];

        if let Some(caps) = import_bare().captures(text) {
            let end = offset + caps[0].len();
            let spec = specifier(&caps, 1, 2).unwrap_or_default();
            let id = self.require_id(spec);
            self.edit(offset, end, format!("require({});", id));
            return;
        }

        let Some(caps) = import_from().captures(text) else {
            self.error("Malformed import statement", offset);
            return;
        };
        let end = offset + caps[0].len();

        if caps.get(1).is_some() {
            self.edit(offset, end, String::new());
            return;
        }

        let clause = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let Some(clause) = ImportClause::parse(clause) else {
            self.error("Malformed import statement", offset);
            return;
        };
        let spec = specifier(&caps, 3, 4).unwrap_or_default();
        let id = self.require_id(spec);

        let replacement = match (&clause.default, &clause.namespace, clause.named.is_empty()) {
            (Some(default), None, true) => {
                format!("var {} = __importDefault(require({}));", default, id)
            }
            (None, Some(namespace), true) => format!("var {} = require({});", namespace, id),
            (None, None, true) => format!("require({});", id),
            _ => {
                let module = self.next_temp("__i");
                let mut decls = vec![format!("{} = require({})", module, id)];
                if let Some(default) = &clause.default {
                    decls.push(format!("{} = __importDefault({})", default, module));
                }
                if let Some(namespace) = &clause.namespace {
                    decls.push(format!("{} = {}", namespace, module));
                }
                for (imported, local) in &clause.named {
                    decls.push(format!("{} = {}.{}", local, module, imported));
                }
                format!("var {};", decls.join(", "))
            }
        };
        self.edit(offset, end, replacement);
    }

    fn export(&mut self, offset: usize) {
        let text = &self.source[offset..];

        if let Some(m) = export_type_only().find(text) {
            self.edit(offset, offset + m.end(), String::new());
            return;
        }

        if let Some(caps) = export_star().captures(text) {
            let end = offset + caps[0].len();
            let spec = specifier(&caps, 2, 3).unwrap_or_default();
            let id = self.require_id(spec);
            let replacement = match caps.get(1) {
                Some(namespace) => {
                    let module = self.next_temp("__r");
                    self.exports
                        .push((namespace.as_str().to_string(), module.clone()));
                    format!("var {} = require({});", module, id)
                }
                None => format!("__exportStar(exports, require({}));", id),
            };
            self.edit(offset, end, replacement);
            return;
        }

        if let Some(caps) = export_list().captures(text) {
            self.export_list(offset, &caps);
            return;
        }

        if let Some(caps) = export_default_function().captures(text) {
            let head = caps.get(1).map(|m| (m.start(), m.end())).unwrap_or_default();
            match caps.get(2) {
                Some(name) => {
                    self.exports
                        .push(("default".to_string(), name.as_str().to_string()));
                    self.edit(offset, offset + head.0, String::new());
                }
                None => {
                    self.exports
                        .push(("default".to_string(), "__default".to_string()));
                    let replacement = format!("{} __default", &text[head.0..head.1]);
                    self.edit(offset, offset + head.1, replacement);
                }
            }
            return;
        }

        if let Some(caps) = export_default_class().captures(text) {
            let head = caps.get(1).map(|m| (m.start(), m.end())).unwrap_or_default();
            let name = caps
                .get(2)
                .map(|m| m.as_str())
                .filter(|n| *n != "extends" && *n != "implements");
            match name {
                Some(name) => {
                    self.exports.push(("default".to_string(), name.to_string()));
                    self.edit(offset, offset + head.0, String::new());
                }
                None => {
                    self.exports
                        .push(("default".to_string(), "__default".to_string()));
                    let replacement = format!("{} __default", &text[head.0..head.1]);
                    self.edit(offset, offset + head.1, replacement);
                }
            }
            return;
        }

        if let Some(m) = export_default_type().find(text) {
            let keyword = m.end() - "interface".len();
            self.edit(offset, offset + keyword, String::new());
            return;
        }

        if let Some(caps) = export_declaration().captures(text) {
            self.export_declaration(offset, &caps);
            return;
        }

        if let Some(m) = export_default_expr().find(text) {
            self.exports
                .push(("default".to_string(), "__default".to_string()));
            self.edit(offset, offset + m.end(), "var __default = ".to_string());
            return;
        }

        self.error("Unsupported export statement", offset);
    }

    fn export_list(&mut self, offset: usize, caps: &Captures<'_>) {
        let end = offset + caps[0].len();
        let list = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let Some(specifiers) = parse_specifiers(list) else {
            self.error("Malformed export statement", offset);
            return;
        };

        match specifier(caps, 2, 3) {
            Some(spec) => {
                let id = self.require_id(spec);
                let module = self.next_temp("__r");
                for (local, exported) in specifiers {
                    self.exports
                        .push((exported, format!("{}.{}", module, local)));
                }
                self.edit(offset, end, format!("var {} = require({});", module, id));
            }
            None => {
                for (local, exported) in specifiers {
                    self.exports.push((exported, local));
                }
                self.edit(offset, end, String::new());
            }
        }
    }

    fn export_declaration(&mut self, offset: usize, caps: &Captures<'_>) {
        let text = &self.source[offset..];
        let keyword = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let keyword_start = caps.get(1).or_else(|| caps.get(2)).map(|m| m.start());
        let Some(keyword_start) = keyword_start else {
            self.error("Malformed export statement", offset);
            return;
        };

        let ambient = caps.get(1).is_some();
        let type_only = keyword == "type" || keyword == "interface";
        if !ambient && !type_only {
            let rest = &text[caps[0].len()..];
            let names = if keyword == "const" || keyword == "let" || keyword == "var" {
                binding_names(rest)
            } else {
                ident().find(rest).map(|m| vec![m.as_str().to_string()])
            };
            match names {
                Some(names) if !names.is_empty() => {
                    for name in names {
                        self.exports.push((name.clone(), name));
                    }
                }
                _ => {
                    self.error("Malformed export statement", offset);
                    return;
                }
            }
        }

        self.edit(offset, offset + keyword_start, String::new());
    }

    fn finish(mut self) -> LinkedSource {
        self.edits.sort_by_key(|e| e.start);

        let mut code = String::with_capacity(self.source.len() + 256);
        if !self.exports.is_empty() {
            let getters: Vec<String> = self
                .exports
                .iter()
                .map(|(name, expr)| format!("{}: () => {}", js_string(name), expr))
                .collect();
            code.push_str(&format!("__export(exports, {{ {} }}); ", getters.join(", ")));
        }

        let mut cursor = 0;
        for edit in &self.edits {
            if edit.start < cursor {
                continue;
            }
            code.push_str(&self.source[cursor..edit.start]);
            code.push_str(&edit.replacement);
            cursor = edit.end;
        }
        code.push_str(&self.source[cursor..]);

        self.out.code = code;
        self.out
    }
}

/// Parsed `import` clause.
#[derive(Debug, Default, PartialEq, Eq)]
struct ImportClause {
    default: Option<String>,
    namespace: Option<String>,
    /// `(imported, local)` pairs, type-only specifiers removed.
    named: Vec<(String, String)>,
}

impl ImportClause {
    fn parse(clause: &str) -> Option<Self> {
        let mut result = ImportClause::default();
        let mut rest = clause.trim();

        if !rest.starts_with('{') && !rest.starts_with('*') {
            let (default, tail) = match rest.split_once(',') {
                Some((default, tail)) => (default.trim(), tail.trim()),
                None => (rest, ""),
            };
            if !is_ident(default) {
                return None;
            }
            result.default = Some(default.to_string());
            rest = tail;
        }

        if let Some(namespace) = rest.strip_prefix('*') {
            let name = namespace.trim().strip_prefix("as")?.trim();
            if !is_ident(name) {
                return None;
            }
            result.namespace = Some(name.to_string());
        } else if let Some(list) = rest.strip_prefix('{') {
            let list = list.strip_suffix('}')?;
            // Import specifiers read `imported as local`.
            result.named = parse_specifiers(list)?;
        } else if !rest.is_empty() {
            return None;
        }

        Some(result)
    }
}

/// `a, b as c, type D` -> `[(a, a), (b, c)]`.
fn parse_specifiers(list: &str) -> Option<Vec<(String, String)>> {
    let mut specifiers = Vec::new();
    for item in list.split(',') {
        let item = item.trim();
        if item.is_empty() || item.starts_with("type ") {
            continue;
        }
        let (first, second) = match item.split_once(" as ") {
            Some((first, second)) => (first.trim(), second.trim()),
            None => (item, item),
        };
        if !is_ident(first) || !is_ident(second) {
            return None;
        }
        specifiers.push((first.to_string(), second.to_string()));
    }
    Some(specifiers)
}

/// Names bound by the first declarator of a `const`/`let`/`var` statement.
fn binding_names(rest: &str) -> Option<Vec<String>> {
    let rest = rest.trim_start();
    if let Some(m) = ident().find(rest) {
        return Some(vec![m.as_str().to_string()]);
    }

    let open = rest.chars().next()?;
    if open != '{' && open != '[' {
        return None;
    }
    let end = matching_close(rest)?;
    let mut names = Vec::new();
    collect_pattern_names(&rest[1..end], open == '{', &mut names);
    Some(names)
}

/// Byte index of the bracket closing the one at index 0.
fn matching_close(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas outside nested brackets.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn collect_pattern_names(inner: &str, object: bool, names: &mut Vec<String>) {
    for element in split_top_level(inner) {
        let element = element.trim().trim_start_matches("...").trim();
        if element.is_empty() {
            continue;
        }
        let target = if object {
            match split_top_level_colon(element) {
                Some((_, value)) => value,
                None => element,
            }
        } else {
            element
        };
        let target = target.split('=').next().unwrap_or(target).trim();
        if target.starts_with('{') || target.starts_with('[') {
            if let Some(end) = matching_close(target) {
                collect_pattern_names(&target[1..end], target.starts_with('{'), names);
            }
        } else if is_ident(target) {
            names.push(target.to_string());
        }
    }
}

fn split_top_level_colon(element: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (i, c) in element.char_indices() {
        match c {
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth -= 1,
            ':' if depth == 0 => return Some((&element[..i], element[i + 1..].trim())),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::scanner::scan;
    use crate::vfs::VirtualFileStore;

    fn link_source(source: &str) -> LinkedSource {
        let store = VirtualFileStore::from_files([
            ("/src/App.tsx", ""),
            ("/src/util.ts", ""),
        ])
        .unwrap();
        let resolver = ModuleResolver::new(&store);
        let scanned = scan("/src/main.tsx", source, true);
        assert!(scanned.diagnostics.is_empty(), "{:?}", scanned.diagnostics);
        link("/src/main.tsx", source, &scanned.statements, &resolver)
    }

    #[test]
    fn test_import_forms() {
        let linked = link_source(
            "import React, { useState as useS, type FC } from 'react'\n\
             import App from './App'\n\
             import * as util from \"./util\";\n\
             import './index.css'\n\
             import type { Props } from './App'\n",
        );
        let lines: Vec<&str> = linked.code.lines().collect();
        assert_eq!(
            lines,
            vec![
                "var __i0 = require(\"framework-stub:react\"), React = __importDefault(__i0), useS = __i0.useState;",
                "var App = __importDefault(require(\"/src/App.tsx\"));",
                "var util = require(\"/src/util.ts\");",
                "require(\"css-stub:/src/index.css\");",
                "",
            ]
        );
        assert_eq!(linked.dependencies.len(), 4);
    }

    #[test]
    fn test_imports_sharing_a_line() {
        let linked = link_source("import React from 'react'; import './index.css'\n");
        assert_eq!(
            linked.code.lines().next(),
            Some("var React = __importDefault(require(\"framework-stub:react\")); require(\"css-stub:/src/index.css\");")
        );
        assert_eq!(linked.dependencies.len(), 2);
    }

    #[test]
    fn test_export_forms() {
        let linked = link_source(
            "export const a = 1\n\
             export function f() {}\n\
             export class K {}\n\
             export const { b, c: d, ...e } = obj\n\
             export type T = string\n\
             export interface I {}\n\
             export { a as alias, f }\n\
             export default a\n",
        );
        assert!(linked.diagnostics.is_empty());
        let expected_prefix = "__export(exports, { \"a\": () => a, \"f\": () => f, \"K\": () => K, \"b\": () => b, \"d\": () => d, \"e\": () => e, \"alias\": () => a, \"f\": () => f, \"default\": () => __default }); ";
        assert!(linked.code.starts_with(expected_prefix), "{}", linked.code);
        let body: Vec<&str> = linked.code[expected_prefix.len()..].lines().collect();
        assert_eq!(
            body,
            vec![
                "const a = 1",
                "function f() {}",
                "class K {}",
                "const { b, c: d, ...e } = obj",
                "type T = string",
                "interface I {}",
                "",
                "var __default = a",
            ]
        );
    }

    #[test]
    fn test_export_default_declarations() {
        let named = link_source("export default function App() {\n  return null\n}\n");
        assert!(named.code.ends_with("function App() {\n  return null\n}\n"));
        assert!(named.code.starts_with("__export(exports, { \"default\": () => App }); "));

        let anonymous = link_source("export default class extends Base {}\n");
        assert!(anonymous.code.ends_with("class __default extends Base {}\n"));

        let arrow = link_source("export default async function () {}\n");
        assert!(arrow.code.ends_with("async function __default () {}\n"));
    }

    #[test]
    fn test_reexports() {
        let linked = link_source(
            "export * from './util'\nexport * as app from './App'\nexport { x as y, default as App } from './App'\n",
        );
        let lines: Vec<&str> = linked.code.lines().collect();
        assert!(lines[0].ends_with("__exportStar(exports, require(\"/src/util.ts\"));"));
        assert!(lines[0].contains("\"app\": () => __r0"));
        assert!(lines[0].contains("\"y\": () => __r1.x"));
        assert!(lines[0].contains("\"App\": () => __r1.default"));
        assert_eq!(lines[1], "var __r0 = require(\"/src/App.tsx\");");
        assert_eq!(lines[2], "var __r1 = require(\"/src/App.tsx\");");
        assert_eq!(linked.dependencies.len(), 2);
    }

    #[test]
    fn test_multiline_statement_keeps_line_count() {
        let source = "import {\n  a,\n  b,\n} from './util'\nconsole.log(a, b)\n";
        let linked = link_source(source);
        assert_eq!(linked.code.lines().count(), source.lines().count());
        assert!(linked.code.starts_with("var __i0 = require(\"/src/util.ts\"), a = __i0.a, b = __i0.b;\n\n\n\n"));
    }

    #[test]
    fn test_malformed_statements_are_reported() {
        let linked = link_source("import = nope\nexport = thing\n");
        let messages: Vec<String> = linked.diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("/src/main.tsx:1:1: ERROR: Malformed import statement"));
        assert!(messages[1].starts_with("/src/main.tsx:2:1: ERROR: Unsupported export statement"));
    }
}
