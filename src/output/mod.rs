pub mod console;
pub mod json;
pub mod sarif;

use serde::{Deserialize, Serialize};

use crate::analysis::NamespaceGroup;
use crate::error::Result;
use crate::InspectReport;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Sarif,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Some(Self::Console),
            "json" => Some(Self::Json),
            "sarif" => Some(Self::Sarif),
            _ => None,
        }
    }
}

/// Render an inspection report into the specified format.
pub fn render(report: &InspectReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(console::render(report)),
        OutputFormat::Json => json::render(report),
        OutputFormat::Sarif => sarif::render(&report.routes, &report.target_name),
    }
}

/// Render discovered namespace groups. SARIF has no notion of these and
/// falls back to JSON.
pub fn render_groups(groups: &[NamespaceGroup], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(console::render_groups(groups)),
        OutputFormat::Json | OutputFormat::Sarif => json::render_groups(groups),
    }
}
