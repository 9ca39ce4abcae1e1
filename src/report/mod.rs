pub mod github;
pub mod json;
pub mod junit;
pub mod text;
pub mod types;

use anyhow::Result;
use clap::ValueEnum;
use std::path::Path;

pub use types::{RunReport, RunSummary, Suite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Github,
    Junit,
}

/// Render a report in the given format
pub fn render(report: &RunReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::render(report)),
        OutputFormat::Json => json::render(report),
        OutputFormat::Github => Ok(github::render(report)),
        OutputFormat::Junit => junit::generate_junit_xml(report),
    }
}

/// Write a rendered report to `output`, or stdout when none is given
pub fn emit(report: &RunReport, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    if output.is_some() {
        // Files never get ANSI colour codes
        colored::control::set_override(false);
    }
    let rendered = render(report, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            log::info!("Report saved to: {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
