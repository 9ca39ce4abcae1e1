//! Local build and test tooling for custom node modules
//!
//! Both tools are external processes; only their exit status and output
//! are interpreted here.

use crate::error::{HarnessError, HarnessResult};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Compiler used when the preferred build CLI is not installed
pub const FALLBACK_COMPILER: &str = "tsc";

/// Result of running an external tool
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// stderr, or stdout when stderr is empty
    pub diagnostics: String,
}

/// Resolve a program from PATH
pub fn resolve_program(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Run a program to completion in `cwd`, capturing its output
pub async fn run_captured(program: &Path, args: &[String], cwd: &Path) -> HarnessResult<ProcessOutcome> {
    debug!("Running {} {:?} in {}", program.display(), args, cwd.display());
    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| HarnessError::Process {
            program: program.display().to_string(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let diagnostics = if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    };

    Ok(ProcessOutcome {
        success: output.status.success(),
        exit_code: output.status.code(),
        diagnostics,
    })
}

/// TypeScript compiler for node modules
pub struct Compiler {
    build_cli: String,
}

impl Compiler {
    pub fn new(build_cli: &str) -> Self {
        Self {
            build_cli: build_cli.to_string(),
        }
    }

    /// The program and arguments that will be used for a build
    pub fn command(&self) -> Option<(PathBuf, Vec<String>)> {
        if let Some(cli) = resolve_program(&self.build_cli) {
            return Some((cli, vec!["build".to_string()]));
        }
        resolve_program(FALLBACK_COMPILER).map(|tsc| (tsc, Vec::new()))
    }

    /// Compile the module in `module_path`
    ///
    /// A missing toolchain is reported as a failed compilation, not as an
    /// error, so the remaining checks still run.
    pub async fn compile(&self, module_path: &Path) -> ProcessOutcome {
        let Some((program, args)) = self.command() else {
            warn!(
                "Neither {} nor {} found in PATH",
                self.build_cli, FALLBACK_COMPILER
            );
            return ProcessOutcome {
                success: false,
                exit_code: None,
                diagnostics: format!(
                    "No compiler available ({} or {})",
                    self.build_cli, FALLBACK_COMPILER
                ),
            };
        };

        info!("Compiling node module {}...", module_path.display());
        match run_captured(&program, &args, module_path).await {
            Ok(outcome) => {
                if outcome.success {
                    info!("Successfully compiled {}", module_path.display());
                } else {
                    warn!("Compilation failed: {}", outcome.diagnostics);
                }
                outcome
            }
            Err(e) => {
                warn!("Error during compilation: {}", e);
                ProcessOutcome {
                    success: false,
                    exit_code: None,
                    diagnostics: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captured_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let sh = resolve_program("sh").expect("sh available on unix");

        let ok = run_captured(&sh, &["-c".to_string(), "echo built".to_string()], dir.path())
            .await
            .unwrap();
        assert!(ok.success);
        assert_eq!(ok.diagnostics, "built");

        let failed = run_captured(
            &sh,
            &["-c".to_string(), "echo 'TS2304: bad' 1>&2; exit 2".to_string()],
            dir.path(),
        )
        .await
        .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.exit_code, Some(2));
        assert_eq!(failed.diagnostics, "TS2304: bad");
    }

    #[tokio::test]
    async fn test_missing_program_is_process_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_captured(Path::new("/definitely/not/a/compiler"), &[], dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::Process { .. }));
    }
}
