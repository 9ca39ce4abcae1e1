//! Static checks over custom node sources
//!
//! Rules are advisory pattern checks on TypeScript text. They never parse
//! the code; each one can be run and tested on its own.

pub mod credentials;
pub mod schema;

use crate::error::HarnessResult;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub use credentials::CredentialRule;
pub use schema::SchemaRule;

/// A source file and its text
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Paths of the `*.ts` files directly inside `dir`, sorted by name
pub fn typescript_files(dir: &Path) -> Vec<PathBuf> {
    let pattern = format!(
        "{}/*.ts",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    match glob::glob(&pattern) {
        Ok(paths) => {
            let mut files: Vec<PathBuf> = paths.filter_map(Result::ok).filter(|p| p.is_file()).collect();
            files.sort();
            files
        }
        Err(e) => {
            log::warn!("Invalid source pattern {}: {}", pattern, e);
            Vec::new()
        }
    }
}

/// Read every `*.ts` file directly inside `dir`
pub fn load_sources(dir: &Path) -> HarnessResult<Vec<SourceFile>> {
    typescript_files(dir)
        .into_iter()
        .map(|path| {
            let content = std::fs::read_to_string(&path)?;
            Ok(SourceFile::new(path, content))
        })
        .collect()
}

/// The file that most likely defines the node: the first whose name
/// contains "node", else the first file
pub fn main_source(files: &[SourceFile]) -> Option<&SourceFile> {
    files
        .iter()
        .find(|f| f.file_name().to_lowercase().contains("node"))
        .or_else(|| files.first())
}

/// Result of applying one rule
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub success: bool,
    pub message: String,
    pub details: Map<String, Value>,
}

impl RuleOutcome {
    pub fn no_sources() -> Self {
        Self {
            success: false,
            message: "No TypeScript source files found".to_string(),
            details: Map::new(),
        }
    }
}

/// A static check over a module's sources
pub trait SourceRule {
    /// Name used in reports, e.g. "schema_validation"
    fn name(&self) -> &'static str;

    fn check(&self, files: &[SourceFile]) -> RuleOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_source_prefers_node_file() {
        let files = vec![
            SourceFile::new("helpers.ts", ""),
            SourceFile::new("OpenAi.node.ts", ""),
        ];
        assert_eq!(main_source(&files).unwrap().file_name(), "OpenAi.node.ts");

        let files = vec![SourceFile::new("a.ts", ""), SourceFile::new("b.ts", "")];
        assert_eq!(main_source(&files).unwrap().file_name(), "a.ts");
        assert!(main_source(&[]).is_none());
    }

    #[test]
    fn test_load_sources_only_reads_typescript() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.node.ts"), "export class B {}").unwrap();
        std::fs::write(dir.path().join("a.ts"), "export const a = 1;").unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();

        let files = load_sources(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(SourceFile::file_name).collect();
        assert_eq!(names, vec!["a.ts", "b.node.ts"]);
    }
}
