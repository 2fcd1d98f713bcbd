//! Report output shared by every command.

use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Serialize;

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parses an output format from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format: '{}'. Valid formats: text, json", s)),
        }
    }

    /// Renders `value` as pretty JSON or through `text`.
    ///
    /// Non-finite floats (an infinite profit factor, say) serialize as `null`.
    pub fn render<T: Serialize>(self, value: &T, text: impl FnOnce(&T) -> String) -> Result<String> {
        match self {
            OutputFormat::Text => Ok(text(value)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        }
    }
}

/// Writes `value` as pretty JSON when an output path was given.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(path, json)?;
        tracing::info!("Results written to {}", path.display());
    }
    Ok(())
}
