//! Tool-call protocol parser.
//!
//! Converts one free-form assistant response into display text, ordered
//! file operations, ordered terminal commands and an optional code
//! suggestion. Recognized constructs:
//!
//! - fenced code blocks (first script fence becomes the suggestion)
//! - one legacy JSON object `{"action": "create"|"delete", ...}`
//! - `<create_file>`, `<update_file>`, `<delete_file>` blocks
//! - `<execute_command>` blocks
//!
//! Each kind is scanned over the whole response independently. Nothing
//! here returns an error; rejected blocks are logged and dropped.

mod display;
mod heuristics;
mod legacy;
mod parser;
mod tags;
#[cfg(test)]
mod tests;

pub use display::{display_text, strip_fences, suggested_code};
pub use heuristics::{is_code_path, looks_like_non_code};
pub use parser::{parse, ResponseParser};
