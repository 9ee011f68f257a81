//! Error bridge between the sandbox and its host.
//!
//! The sandbox can post exactly one message shape to the host. The host
//! never posts anything back.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Script installed before user code. Forwards uncaught errors, unhandled
/// rejections and top-level evaluation failures to the parent context.
pub const BRIDGE_SCRIPT: &str = r#"(function () {
  function post(error) {
    try {
      window.parent.postMessage({ type: "runtime-error", error: error }, "*");
    } catch (ignored) {}
  }
  function describe(value) {
    if (value && typeof value === "object" && "message" in value) {
      return { message: String(value.message), stack: value.stack ? String(value.stack) : undefined };
    }
    return { message: String(value) };
  }
  window.addEventListener("error", function (event) {
    var error = describe(event.error || event.message);
    error.message = event.message || error.message;
    error.filename = event.filename || undefined;
    error.lineno = event.lineno || undefined;
    error.colno = event.colno || undefined;
    post(error);
  });
  window.addEventListener("unhandledrejection", function (event) {
    post(describe(event.reason));
  });
  window.__livepadReportFailure = function (value) {
    var error = describe(value);
    var root = document.getElementById("root");
    if (root) {
      var node = document.createElement("div");
      node.style.color = "red";
      node.style.padding = "20px";
      node.style.whiteSpace = "pre-wrap";
      node.textContent = "Error: " + error.message;
      root.innerHTML = "";
      root.appendChild(node);
    }
    post(error);
  };
})();
"#;

/// Details of an error raised while the bundle ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colno: Option<u64>,
}

/// Message type tag of the only message a sandbox may send.
pub const RUNTIME_ERROR_TYPE: &str = "runtime-error";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    error: RuntimeError,
}

/// Decode a message posted by a sandbox.
///
/// Anything that is not exactly a runtime-error message is ignored.
pub fn decode_message(payload: &str) -> Option<RuntimeError> {
    match serde_json::from_str::<Envelope>(payload) {
        Ok(envelope) if envelope.kind == RUNTIME_ERROR_TYPE => Some(envelope.error),
        Ok(envelope) => {
            debug!("Ignoring sandbox message of type {:?}", envelope.kind);
            None
        }
        Err(e) => {
            debug!("Ignoring sandbox message: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_runtime_error() {
        let error = decode_message(
            r#"{"type":"runtime-error","error":{"message":"boom","stack":"at App","lineno":3,"colno":7,"filename":"about:srcdoc"}}"#,
        )
        .unwrap();
        assert_eq!(error.message, "boom");
        assert_eq!(error.stack.as_deref(), Some("at App"));
        assert_eq!(error.lineno, Some(3));
        assert_eq!(error.colno, Some(7));
    }

    #[test]
    fn test_decode_minimal() {
        let error = decode_message(r#"{"type":"runtime-error","error":{"message":"x"}}"#).unwrap();
        assert_eq!(error.stack, None);
        assert_eq!(error.filename, None);
    }

    #[test]
    fn test_other_shapes_are_ignored() {
        for payload in [
            r#"{"type":"log","error":{"message":"x"}}"#,
            r#"{"type":"runtime-error"}"#,
            r#"{"type":"runtime-error","error":{"stack":"x"}}"#,
            r#"{"type":"runtime-error","error":{"message":"x"},"extra":1}"#,
            r#"{"type":"runtime-error","error":{"message":"x","extra":1}}"#,
            r#"{"type":"runtime-error","error":{"message":"x","lineno":"3"}}"#,
            "not json",
        ] {
            assert_eq!(decode_message(payload), None, "{}", payload);
        }
    }

    #[test]
    fn test_bridge_script_is_inert_html() {
        assert!(!BRIDGE_SCRIPT.to_ascii_lowercase().contains("</script"));
        assert!(!BRIDGE_SCRIPT.contains("addEventListener(\"message\""));
    }
}
