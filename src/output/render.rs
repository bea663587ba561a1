//! Text and JSON rendering of command output

use crate::error::{GridError, Result};
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;

/// How command output is printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl OutputFormat {
    /// Format selected by the --json flag
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Render `value` in `format`
pub fn render<T: Serialize + Display>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(value.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| GridError::config(format!("Failed to render JSON output: {}", e))),
    }
}

/// Render `value` and write it to `out` followed by a newline.
///
/// Empty text output prints nothing.
pub fn print_output<T: Serialize + Display>(
    out: &mut dyn Write,
    value: &T,
    format: OutputFormat,
) -> Result<()> {
    let text = render(value, format)?;
    if text.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}", text)
        .and_then(|_| out.flush())
        .map_err(|e| GridError::io("<stdout>", e))
}
