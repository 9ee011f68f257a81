use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use crate::protocol::ResponseParser;

/// Read a response from `file`, or stdin when absent.
pub fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read response file: {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read response from stdin")?;
            Ok(raw)
        }
    }
}

pub fn run_parse(file: Option<&Path>, active_file: Option<&str>) -> Result<()> {
    let raw = read_input(file)?;
    let parsed = ResponseParser::with_active_file(active_file).parse(&raw);
    let json = serde_json::to_string_pretty(&parsed).context("Failed to serialize response")?;
    println!("{}", json);
    Ok(())
}
