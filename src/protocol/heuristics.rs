//! Content-type heuristics guarding code files against prose.

use crate::vfs::paths::extension;

const CODE_EXTENSIONS: [&str; 6] = ["ts", "tsx", "js", "jsx", "css", "json"];
const TREE_MARKERS: [&str; 3] = ["├──", "└──", "│"];
const TOP_LEVEL_DIRS: [&str; 4] = ["src/", "public/", "components/", "pages/"];

/// Whether a path names a code file the bundler would consume.
pub fn is_code_path(path: &str) -> bool {
    extension(path.trim())
        .map(|ext| CODE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Whether `content` reads like documentation or a directory listing
/// rather than source code.
pub fn looks_like_non_code(content: &str) -> bool {
    if TREE_MARKERS.iter().any(|m| content.contains(m)) {
        return true;
    }

    let Some(first) = content.lines().find(|l| !l.trim().is_empty()) else {
        return false;
    };

    first.starts_with('#')
        || first.starts_with("**")
        || is_list_item(first)
        || is_numbered_item(first)
        || TOP_LEVEL_DIRS.iter().any(|d| first.starts_with(d))
}

fn is_list_item(line: &str) -> bool {
    let mut chars = line.chars();
    chars.next() == Some('-') && chars.next().map(char::is_whitespace).unwrap_or(false)
}

fn is_numbered_item(line: &str) -> bool {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && line[digits..].starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_code_path() {
        assert!(is_code_path("src/App.tsx"));
        assert!(is_code_path("styles/MAIN.CSS"));
        assert!(is_code_path("package.json"));
        assert!(!is_code_path("README.md"));
        assert!(!is_code_path("notes.txt"));
        assert!(!is_code_path("Dockerfile"));
    }

    #[test]
    fn test_markdown_first_line() {
        assert!(looks_like_non_code("# Title\nbody"));
        assert!(looks_like_non_code("\n\n## Setup"));
        assert!(looks_like_non_code("**Bold** intro"));
        assert!(looks_like_non_code("- item one\n- item two"));
        assert!(looks_like_non_code("1. first step"));
        assert!(looks_like_non_code("src/\n  App.tsx"));
    }

    #[test]
    fn test_tree_characters_anywhere() {
        assert!(looks_like_non_code("project\n├── src\n└── index.html"));
    }

    #[test]
    fn test_code_is_accepted() {
        assert!(!looks_like_non_code("import React from 'react'\n# not a heading"));
        assert!(!looks_like_non_code("export const x = -1"));
        assert!(!looks_like_non_code(".App { color: red; }"));
        assert!(!looks_like_non_code("{\"name\": \"demo\"}"));
        assert!(!looks_like_non_code("--x: 1"));
        assert!(!looks_like_non_code(""));
    }
}
