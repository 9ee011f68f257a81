//! Tests for the protocol parser.

#[cfg(test)]
mod tests {
    use crate::domain::FileOperation;
    use crate::protocol::{parse, strip_fences, ResponseParser};

    fn create(path: &str, content: &str) -> FileOperation {
        FileOperation::Create {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_plain_response_has_no_operations() {
        let raw = "  Here is an idea.\n```tsx\nconst a = 1\n```\nThat is all.\n";
        let parsed = parse(raw);
        assert!(parsed.file_operations.is_empty());
        assert!(parsed.terminal_commands.is_empty());
        assert_eq!(parsed.display_text, strip_fences(raw).trim());
        assert_eq!(parsed.suggested_code.as_deref(), Some("const a = 1"));
    }

    #[test]
    fn test_create_content_is_trimmed_inner_text() {
        let raw = "<create_file>\n<path>docs/NOTES.md</path>\n<content>\n\n# Notes\n\n- one\n  indented\n\n</content>\n</create_file>";
        let parsed = parse(raw);
        assert_eq!(
            parsed.file_operations,
            vec![create("docs/NOTES.md", "# Notes\n\n- one\n  indented")]
        );
        assert_eq!(parsed.display_text, "");
    }

    #[test]
    fn test_markdown_in_code_file_is_dropped() {
        let raw = "<create_file><path>src/x.ts</path><content># Title\nbody</content></create_file>";
        assert_eq!(parse(raw).file_operations, vec![]);
    }

    #[test]
    fn test_tree_listing_in_update_is_dropped() {
        let raw = "<update_file><path>src/App.tsx</path><content>my-app\n├── src\n└── index.html</content></update_file>";
        assert!(parse(raw).file_operations.is_empty());
    }

    #[test]
    fn test_docs_into_open_file_are_dropped() {
        let raw = "<update_file><path>NOTES</path><content>## Structure\ntext</content></update_file>";
        let parser = ResponseParser::with_active_file(Some("/NOTES"));
        assert!(parser.parse(raw).file_operations.is_empty());

        // A different file without a code extension keeps the update.
        let parser = ResponseParser::with_active_file(Some("/src/App.tsx"));
        assert_eq!(parser.parse(raw).file_operations.len(), 1);
    }

    #[test]
    fn test_mixed_blocks_keep_source_order() {
        let raw = r#"First remove the old page.
<delete_file><path>src/Old.tsx</path></delete_file>
<execute_command><command>npm install</command></execute_command>
Then add the new one.
<create_file><path>src/New.tsx</path><content>export default function New() { return null }</content></create_file>
<update_file><path>src/App.tsx</path><content>import New from './New'</content></update_file>
<execute_command><command>ls</command></execute_command>"#;
        let parsed = parse(raw);
        assert_eq!(
            parsed.file_operations,
            vec![
                FileOperation::Delete {
                    path: "src/Old.tsx".to_string()
                },
                create("src/New.tsx", "export default function New() { return null }"),
                FileOperation::Update {
                    path: "src/App.tsx".to_string(),
                    content: "import New from './New'".to_string()
                },
            ]
        );
        assert_eq!(parsed.terminal_commands, vec!["npm install", "ls"]);
        assert_eq!(
            parsed.display_text,
            "First remove the old page.\n\nThen add the new one."
        );
    }

    #[test]
    fn test_bad_legacy_json_does_not_block_tags() {
        let raw = r#"{"action": "create", "fileName": broken}
<create_file><path>src/a.ts</path><content>export const a = 1</content></create_file>"#;
        let parsed = parse(raw);
        assert_eq!(parsed.file_operations, vec![create("src/a.ts", "export const a = 1")]);
    }

    #[test]
    fn test_legacy_json_is_ordered_by_position() {
        let raw = r#"<delete_file><path>src/a.ts</path></delete_file>
{"action": "create", "fileName": "src/b.ts", "content": "export {}"}"#;
        let ops = parse(raw).file_operations;
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].kind(), "delete");
        assert_eq!(ops[1], create("src/b.ts", "export {}"));
    }

    #[test]
    fn test_malformed_blocks_are_skipped() {
        let raw = "<create_file><path>src/a.ts</path><content>unterminated\n\
                   <delete_file><path></path></delete_file>\n\
                   <update_file><path>src/b.ts</path><content>   </content></update_file>\n\
                   <execute_command><command>  </command></execute_command>";
        let parsed = parse(raw);
        assert!(parsed.file_operations.is_empty());
        assert!(parsed.terminal_commands.is_empty());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let raw = "<create_file><path>a.css</path><content>a { color: red }</content></create_file>";
        assert_eq!(parse(raw), parse(raw));
    }
}
