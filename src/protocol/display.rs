//! Display text and inline code suggestion.

use regex::Regex;
use std::sync::OnceLock;

use super::tags::{strip, TagKind};

fn any_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```.*?```").expect("fence pattern is valid"))
}

const CODE_LANGUAGES: [&str; 7] = ["", "js", "jsx", "ts", "tsx", "javascript", "typescript"];

fn blank_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("blank run pattern is valid"))
}

/// The first fenced block tagged as script code (or untagged), trimmed.
pub fn suggested_code(text: &str) -> Option<String> {
    any_fence().find_iter(text).find_map(|fence| {
        let inner = fence.as_str().strip_prefix("```")?.strip_suffix("```")?;
        let (language, body) = inner.split_once('\n')?;
        if !CODE_LANGUAGES.contains(&language.trim_end()) || body.is_empty() {
            return None;
        }
        Some(body.trim().to_string())
    })
}

/// Remove all fenced code blocks.
pub fn strip_fences(text: &str) -> String {
    any_fence().replace_all(text, "").into_owned()
}

/// Text shown to the user for a response.
///
/// Code fences go first, then every tool-call block kind in a fixed
/// order, then runs of blank lines collapse to one and the result is
/// trimmed.
pub fn display_text(text: &str) -> String {
    let mut out = strip_fences(text);
    for kind in TagKind::STRIP_ORDER {
        out = strip(&out, kind);
    }
    blank_run()
        .replace_all(&out, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_code_takes_first_script_fence() {
        let text = "intro\n```bash\nnpm i\n```\n```tsx\n  const a = 1\n```\n```js\nlater\n```";
        assert_eq!(suggested_code(text), Some("const a = 1".to_string()));
        assert_eq!(suggested_code("```\nplain\n```"), Some("plain".to_string()));
        assert_eq!(suggested_code("no fences"), None);
    }

    #[test]
    fn test_display_text_strips_blocks() {
        let text = "Sure!\n\n```tsx\ncode\n```\n\n\n\n<tool_use>\n<create_file><path>a.ts</path><content>x</content></create_file>\n</tool_use>\n\nDone.  ";
        assert_eq!(display_text(text), "Sure!\n\nDone.");
    }

    #[test]
    fn test_display_text_leaves_no_tag_residue() {
        let text = "A\n<update_file><path>a.ts</path><content>x</content></update_file>\nB\n<delete_file><path>b.ts</path></delete_file>\n<execute_command><command>ls</command></execute_command>";
        let display = display_text(text);
        assert_eq!(display, "A\n\nB");
        assert!(!display.contains('<'));
    }

    #[test]
    fn test_single_blank_lines_are_kept() {
        assert_eq!(display_text("  one\n\ntwo\nthree\n"), "one\n\ntwo\nthree");
    }
}
