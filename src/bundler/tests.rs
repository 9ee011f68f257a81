//! Tests for the bundler pipeline.

#[cfg(test)]
mod tests {
    use crate::bundler::{bundle, bundle_entry, find_entry, Severity};
    use crate::vfs::template::react_starter;
    use crate::vfs::VirtualFileStore;

    fn project(files: &[(&str, &str)]) -> VirtualFileStore {
        VirtualFileStore::from_files(files.iter().copied()).unwrap()
    }

    #[test]
    fn test_starter_project_bundles() {
        let store = react_starter("demo").unwrap();
        let artifact = bundle(&store).unwrap();

        assert!(artifact.diagnostics.is_empty(), "{:?}", artifact.diagnostics);
        assert!(artifact.code.contains("__modules[\"/src/main.tsx\"] = __compile("));
        assert!(artifact.code.contains("__modules[\"/src/App.tsx\"] = __compile("));
        assert!(artifact
            .code
            .contains("__modules[\"framework-stub:react-dom/client\"] = function ("));
        assert!(artifact.code.ends_with("__require(\"/src/main.tsx\");\n})();\n"));

        assert_eq!(artifact.stylesheets.len(), 2);
        assert!(artifact.stylesheets[0].starts_with(":root"));
        assert!(artifact.stylesheets[1].starts_with(".App"));
    }

    #[test]
    fn test_unknown_package_fails_at_import_site() {
        let store = project(&[(
            "/src/main.tsx",
            "import leftPad from 'left-pad'\nconsole.log(leftPad('x', 3))\n",
        )]);
        let artifact = bundle(&store).unwrap();

        assert!(artifact
            .code
            .contains(r#"var leftPad = __importDefault(require(\"npm-stub:left-pad\"));"#));
        assert!(artifact.code.contains(
            "__modules[\"npm-stub:left-pad\"] = function (require, module, exports, __export, __exportStar, __importDefault) {\nthrow new Error(\"Package \\\"left-pad\\\" is not available."
        ));
    }

    #[test]
    fn test_missing_module_is_a_warning() {
        let store = project(&[(
            "/src/main.tsx",
            "import Missing from './components/Missing'\nexport default Missing\n",
        )]);
        let artifact = bundle(&store).unwrap();

        assert_eq!(artifact.diagnostics.len(), 1);
        assert_eq!(artifact.diagnostics[0].severity, Severity::Warning);
        assert!(artifact.diagnostics[0]
            .message
            .contains("/src/components/Missing"));
        assert!(artifact
            .code
            .contains("__modules[\"/src/components/Missing\"] = function ("));
    }

    #[test]
    fn test_valid_sources_are_not_syntax_errors() {
        let store = project(&[
            (
                "/src/main.tsx",
                "import React from 'react'; import './index.css'\nimport { half } from './math'\nexport const Keys = () => <p>Press the ` key, or use /* to start a comment</p>\nconsole.log(half(3))\n",
            ),
            (
                "/src/math.ts",
                "let i = 0\nexport const half = (n: number) => i++ / 2 + n / 2\n",
            ),
            ("/src/index.css", "body { margin: 0 }"),
        ]);
        let artifact = bundle(&store).unwrap();

        assert!(!artifact.code.contains("import './index.css'"));
        assert_eq!(artifact.stylesheets, vec!["body { margin: 0 }".to_string()]);
    }

    #[test]
    fn test_syntax_error_fails_the_build() {
        let store = project(&[
            ("/src/main.tsx", "import App from './App'\nApp()\n"),
            (
                "/src/App.tsx",
                "export default function App() {\n  return <div>\n",
            ),
        ]);
        let failure = bundle(&store).unwrap_err();

        assert_eq!(failure.diagnostics.len(), 1);
        assert_eq!(
            failure.diagnostics[0].to_string(),
            "/src/App.tsx:1:31: ERROR: Unclosed `{`\n  1 | export default function App() {"
        );
    }

    #[test]
    fn test_invalid_json_fails_the_build() {
        let store = project(&[
            ("/src/main.ts", "import data from './data.json'\nconsole.log(data)\n"),
            ("/src/data.json", "{\n  \"a\": 1,\n}\n"),
        ]);
        let failure = bundle(&store).unwrap_err();
        let location = failure.diagnostics[0].location.as_ref().unwrap();
        assert_eq!(location.file, "/src/data.json");
        assert_eq!(location.line, 3);
    }

    #[test]
    fn test_json_and_text_modules() {
        let store = project(&[
            (
                "/src/main.js",
                "import data from './data.json'\nimport notes from './NOTES.md'\n",
            ),
            ("/src/data.json", "{ \"a\": [1, 2] }"),
            ("/src/NOTES.md", "# Notes"),
        ]);
        let artifact = bundle(&store).unwrap();
        assert!(artifact.code.contains("module.exports = {\"a\":[1,2]};"));
        assert!(artifact.code.contains("module.exports = \"# Notes\";"));
    }

    #[test]
    fn test_missing_entry() {
        let store = project(&[("/src/App.tsx", "export default 1")]);
        assert_eq!(find_entry(&store), None);
        let failure = bundle(&store).unwrap_err();
        assert!(failure.diagnostics[0].message.contains("Entry point not found"));
    }

    #[test]
    fn test_entry_preference() {
        let store = project(&[("/src/index.jsx", ""), ("/src/main.js", "")]);
        assert_eq!(find_entry(&store), Some("/src/main.js"));
    }

    #[test]
    fn test_stylesheet_order() {
        let store = project(&[
            (
                "/src/main.tsx",
                "import './theme.css'\nimport './index.css'\nimport './missing.css'\n",
            ),
            ("/src/theme.css", "theme"),
            ("/src/index.css", "global"),
            ("/src/unused.css", "unused"),
        ]);
        let artifact = bundle_entry(&store, "/src/main.tsx").unwrap();
        assert_eq!(artifact.stylesheets, vec!["global", "theme"]);
        assert_eq!(artifact.diagnostics.len(), 1);
        assert!(artifact.diagnostics[0].message.contains("/src/missing.css"));
    }

    #[test]
    fn test_bundle_is_deterministic() {
        let store = react_starter("demo").unwrap();
        assert_eq!(bundle(&store).unwrap(), bundle(&store).unwrap());
    }
}
