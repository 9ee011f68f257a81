//! Preview document assembly.
//!
//! The document is fully self-contained: stylesheets inline, framework
//! runtimes from a CDN, the error bridge, then the bundle wrapped in a
//! top-level try/catch.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use super::bridge::BRIDGE_SCRIPT;

/// Runtime scripts loaded before the bridge, in order.
pub const RUNTIME_SCRIPTS: [&str; 5] = [
    "https://unpkg.com/react@18/umd/react.development.js",
    "https://unpkg.com/react-dom@18/umd/react-dom.development.js",
    "https://unpkg.com/react-router-dom@6/dist/umd/react-router-dom.development.js",
    "https://unpkg.com/axios/dist/axios.min.js",
    "https://unpkg.com/@babel/standalone/babel.min.js",
];

/// A rendered preview document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxDocument {
    pub html: String,
    /// Hex sha256 of `html`.
    pub fingerprint: String,
}

impl SandboxDocument {
    /// Assemble the document for a bundle and its stylesheets.
    pub fn assemble(code: &str, stylesheets: &[String]) -> Self {
        let html = render_html(code, stylesheets);
        let fingerprint = format!("{:x}", Sha256::digest(html.as_bytes()));
        Self { html, fingerprint }
    }

    /// The document as a `data:` URL.
    pub fn data_url(&self) -> String {
        format!("data:text/html;base64,{}", STANDARD.encode(self.html.as_bytes()))
    }
}

fn closing_style() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</(style)").expect("closing style pattern is valid"))
}

fn closing_script() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</(script)").expect("closing script pattern is valid"))
}

/// Keep stylesheet text from terminating the `<style>` element.
pub fn escape_style(text: &str) -> String {
    closing_style().replace_all(text, r"<\/$1").into_owned()
}

/// Keep script text from terminating the `<script>` element or entering
/// the HTML comment-like parsing state.
pub fn escape_script(text: &str) -> String {
    closing_script()
        .replace_all(text, r"<\/$1")
        .replace("<!--", r"<\!--")
}

fn render_html(code: &str, stylesheets: &[String]) -> String {
    let css = stylesheets
        .iter()
        .map(|sheet| escape_style(sheet))
        .collect::<Vec<_>>()
        .join("\n");

    let mut html = String::with_capacity(code.len() + css.len() + 2048);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n  <head>\n");
    html.push_str("    <meta charset=\"UTF-8\" />\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n",
    );
    html.push_str("    <title>Preview</title>\n");
    html.push_str("    <style>\n");
    html.push_str(&css);
    html.push_str("\n    </style>\n");
    for src in RUNTIME_SCRIPTS {
        html.push_str(&format!(
            "    <script crossorigin src=\"{}\"></script>\n",
            src
        ));
    }
    html.push_str("  </head>\n  <body>\n    <div id=\"root\"></div>\n");
    html.push_str("    <script>\n");
    html.push_str(BRIDGE_SCRIPT);
    html.push_str("    </script>\n");
    html.push_str("    <script>\ntry {\n");
    html.push_str(&escape_script(code));
    html.push_str("\n} catch (error) {\n  window.__livepadReportFailure(error);\n}\n    </script>\n");
    html.push_str("  </body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_style() {
        assert_eq!(
            escape_style("a { content: \"</STYLE><b>\" }"),
            "a { content: \"<\\/STYLE><b>\" }"
        );
    }

    #[test]
    fn test_escape_script() {
        assert_eq!(
            escape_script("var s = \"</script><!--\";"),
            "var s = \"<\\/script><\\!--\";"
        );
    }

    #[test]
    fn test_document_layout() {
        let doc = SandboxDocument::assemble(
            "console.log(\"</script>\")",
            &["body { margin: 0 }".to_string(), ".App { color: red }".to_string()],
        );

        let html = &doc.html;
        let style = html.find("body { margin: 0 }\n.App { color: red }").unwrap();
        let react = html.find(RUNTIME_SCRIPTS[0]).unwrap();
        let babel = html.find(RUNTIME_SCRIPTS[4]).unwrap();
        let bridge = html.find("runtime-error").unwrap();
        let user = html.find("console.log(\"<\\/script>\")").unwrap();
        let root = html.find("<div id=\"root\"></div>").unwrap();

        assert!(style < react && react < babel && babel < bridge && bridge < user);
        assert!(root < bridge);
        assert!(html.contains("} catch (error) {\n  window.__livepadReportFailure(error);"));
        assert_eq!(html.matches("</script>").count(), RUNTIME_SCRIPTS.len() + 2);
    }

    #[test]
    fn test_fingerprint_and_data_url() {
        let a = SandboxDocument::assemble("1", &[]);
        let b = SandboxDocument::assemble("2", &[]);
        assert_eq!(a.fingerprint.len(), 64);
        assert_ne!(a.fingerprint, b.fingerprint);
        assert_eq!(a, SandboxDocument::assemble("1", &[]));

        let url = a.data_url();
        let encoded = url.strip_prefix("data:text/html;base64,").unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), a.html);
    }
}
