use serde::Serialize;
use std::fmt;

/// Severity of a build diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Position of a diagnostic in a virtual file. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
    /// The full source line, for display.
    pub line_text: String,
}

impl Location {
    /// Compute the location of byte `offset` in `source`.
    pub fn at(file: &str, source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source.as_bytes()[..offset];
        let line_start = before
            .iter()
            .rposition(|b| *b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let line = before.iter().filter(|b| **b == b'\n').count() + 1;
        let line_end = source[line_start..]
            .find('\n')
            .map(|i| line_start + i)
            .unwrap_or(source.len());
        let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;

        Self {
            file: file.to_string(),
            line,
            column,
            line_text: String::from_utf8_lossy(&source.as_bytes()[line_start..line_end])
                .trim_end_matches('\r')
                .to_string(),
        }
    }
}

/// A message produced while bundling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            location,
        }
    }

    pub fn warning(message: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            location,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        match &self.location {
            Some(loc) => {
                write!(
                    f,
                    "{}:{}:{}: {}: {}",
                    loc.file, loc.line, loc.column, label, self.message
                )?;
                if !loc.line_text.is_empty() {
                    write!(f, "\n  {} | {}", loc.line, loc.line_text)?;
                }
                Ok(())
            }
            None => write!(f, "{}: {}", label, self.message),
        }
    }
}

/// Loader strategy chosen for a resolved import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Namespace {
    Virtual,
    NpmStub,
    FrameworkStub,
    CssStub,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Virtual => "virtual",
            Namespace::NpmStub => "npm-stub",
            Namespace::FrameworkStub => "framework-stub",
            Namespace::CssStub => "css-stub",
        }
    }
}

/// One import site to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub specifier: String,
    pub importer_path: String,
}

impl ResolutionRequest {
    pub fn new(specifier: impl Into<String>, importer_path: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            importer_path: importer_path.into(),
        }
    }
}

/// Where an import resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub resolved_path: String,
    pub namespace: Namespace,
}

impl ResolutionResult {
    pub fn new(resolved_path: impl Into<String>, namespace: Namespace) -> Self {
        Self {
            resolved_path: resolved_path.into(),
            namespace,
        }
    }

    /// Registry key of the module in the emitted bundle.
    pub fn module_id(&self) -> String {
        match self.namespace {
            Namespace::Virtual => self.resolved_path.clone(),
            other => format!("{}:{}", other.as_str(), self.resolved_path),
        }
    }
}

/// Syntax hint attached to loaded module contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Tsx,
    Ts,
    Jsx,
    Js,
    Json,
    Text,
    Empty,
}

impl Loader {
    pub fn as_str(&self) -> &'static str {
        match self {
            Loader::Tsx => "tsx",
            Loader::Ts => "ts",
            Loader::Jsx => "jsx",
            Loader::Js => "js",
            Loader::Json => "json",
            Loader::Text => "text",
            Loader::Empty => "empty",
        }
    }

    /// Whether contents are script source with `import`/`export` statements.
    pub fn is_script(&self) -> bool {
        matches!(self, Loader::Tsx | Loader::Ts | Loader::Jsx | Loader::Js)
    }

    /// Whether the scanner should tolerate JSX text (apostrophes, stray
    /// parentheses) inside the source.
    pub fn allows_jsx(&self) -> bool {
        matches!(self, Loader::Tsx | Loader::Jsx | Loader::Js)
    }
}

/// Output of `load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    pub contents: String,
    pub loader: Loader,
}

impl LoadedModule {
    pub fn new(contents: impl Into<String>, loader: Loader) -> Self {
        Self {
            contents: contents.into(),
            loader,
        }
    }

    pub fn empty() -> Self {
        Self::new(String::new(), Loader::Empty)
    }
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildArtifact {
    /// IIFE-wrapped bundle.
    pub code: String,
    /// Warnings collected while building, in discovery order.
    pub diagnostics: Vec<Diagnostic>,
    /// Stylesheet texts in injection order.
    pub stylesheets: Vec<String>,
}
