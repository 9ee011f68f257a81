//! Prompt construction, seed messages and user-facing output text.

use crate::bundler::Diagnostic;
use crate::error::BuildFailure;
use crate::sandbox::RuntimeError;

/// Built-in instructions describing the tool-call protocol.
pub const PROTOCOL_INSTRUCTIONS: &str = r#"You are a senior front-end engineer pairing with the user on a React + TypeScript project that runs entirely in the browser.

## Environment
- The project is bundled in the browser and previewed in a sandbox. There is no Node.js server and no npm install at runtime.
- Only React and ReactDOM are always available. react-router-dom and axios are loaded from a CDN; any other package is unavailable.
- The entry point is /src/main.tsx (or /src/index.tsx). Global styles live in /src/index.css.

## File operations
Use these blocks to change files. Paths are relative to the project root.

<create_file>
<path>src/components/Button.tsx</path>
<content>
...full file content...
</content>
</create_file>

<update_file>
<path>src/App.tsx</path>
<content>
...full new file content...
</content>
</update_file>

<delete_file>
<path>src/old.ts</path>
</delete_file>

Always send complete file contents, never diffs. Never put markdown or directory trees into code files; write documentation to new .md files.

## Terminal
<execute_command>
<command>npm list</command>
</execute_command>

Keep explanations short. Use at most 5 file operations per response."#;

/// System prompt for code-analysis requests.
pub const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are a senior front-end engineer reviewing code. Provide helpful, educational responses.";

/// Build the chat system prompt around the file the user is viewing.
pub fn system_prompt(
    instructions: &str,
    project_name: &str,
    active_file: Option<&str>,
    active_content: Option<&str>,
) -> String {
    let file = active_file
        .map(|p| p.trim_start_matches('/'))
        .unwrap_or("none");
    format!(
        "{instructions}\n\n\
         ## Current Context (FOR REFERENCE ONLY - DO NOT UPDATE UNLESS EXPLICITLY REQUESTED)\n\
         - **Project Name**: {project}\n\
         - **Currently viewing file**: {file}\n\
         - **File content for context**:\n\
         ```typescript\n{content}\n```\n\n\
         IMPORTANT:\n\
         1. You are working in the root directory of the project \"{project}\". All file operations should be relative to this project root.\n\
         2. The above file is shown for context only. Do NOT update {file} unless the user specifically asks you to modify this particular file.\n\
         3. When creating project documentation or structure descriptions, create new .md files instead.",
        instructions = instructions,
        project = project_name,
        file = file,
        content = active_content.unwrap_or_default(),
    )
}

/// Kinds of single-turn code analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AnalyzeAction {
    Explain,
    Improve,
    Fix,
    Test,
}

/// Prompt for a code-analysis request. `selection` is only used by
/// [`AnalyzeAction::Explain`].
pub fn analysis_prompt(action: AnalyzeAction, code: &str, selection: Option<&str>) -> String {
    let (lead, body) = match action {
        AnalyzeAction::Explain => (
            "Please explain this code in a clear, educational way:",
            selection.filter(|s| !s.is_empty()).unwrap_or(code),
        ),
        AnalyzeAction::Improve => (
            "Review this code and suggest improvements following React best practices:",
            code,
        ),
        AnalyzeAction::Fix => ("Identify and fix any bugs or issues in this code:", code),
        AnalyzeAction::Test => (
            "Generate comprehensive unit tests for this code using React Testing Library:",
            code,
        ),
    };
    format!("{}\n```typescript\n{}\n```", lead, body)
}

/// Seed for asking the assistant about a build or runtime failure.
pub fn build_error_seed(output: &str) -> String {
    format!(
        "I got this error while building my React app:\n\n{}\n\n\
         IMPORTANT: This is a browser-based environment. NPM packages like react-router-dom are NOT available. \
         Please provide an alternative solution using only React and ReactDOM.",
        output
    )
}

/// Seed for asking the assistant about terminal output.
///
/// Uses the last three lines mentioning an error, or the last five lines
/// when none do. `None` when there is no output at all.
pub fn terminal_seed(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    let errors: Vec<&str> = lines
        .iter()
        .filter(|line| line.to_lowercase().contains("error"))
        .map(String::as_str)
        .collect();
    let context = if errors.is_empty() {
        tail(lines.iter().map(String::as_str).collect(), 5)
    } else {
        tail(errors, 3)
    };
    Some(format!(
        "I got this error in the terminal:\n\n{}\n\nCan you help me fix it?",
        context.join("\n")
    ))
}

fn tail(lines: Vec<&str>, n: usize) -> Vec<&str> {
    let skip = lines.len().saturating_sub(n);
    lines.into_iter().skip(skip).collect()
}

/// Output text after a successful build. Warnings are listed, never dropped.
pub fn success_output(warnings: &[Diagnostic]) -> String {
    let mut output = String::from("Build successful!");
    for warning in warnings {
        output.push('\n');
        output.push_str(&warning.to_string());
    }
    output
}

/// Output text for a failed build, with multi-line diagnostics indented.
pub fn failure_output(failure: &BuildFailure) -> String {
    let message = std::iter::once("Build failed:".to_string())
        .chain(failure.diagnostics.iter().map(ToString::to_string))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Build error:\n  {}", message.replace('\n', "\n  "))
}

/// Output text for an error raised inside the sandbox.
pub fn runtime_output(error: &RuntimeError) -> String {
    match &error.stack {
        Some(stack) => format!("Runtime error: {}\n\nStack trace:\n{}", error.message, stack),
        None => format!("Runtime error: {}", error.message),
    }
}
