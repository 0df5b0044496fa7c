//! Spawning of external command-line tools.
//!
//! A [`ProcessRunner`] owns one tool: it locates the executable once (well-known paths first,
//! then a resolver helper such as `which`), caches the path for its own lifetime, and runs the
//! tool with an explicit argument vector. Nothing goes through a shell.

pub mod firebase;
pub mod transporter;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::error::AscError;

/// Captured result of one subprocess run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Helper process that prints the tool's absolute path on one line.
#[derive(Debug, Clone)]
pub struct Resolver {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Where to look for a tool, and what to tell the user when it is missing.
#[derive(Debug, Clone)]
pub struct Locator {
    pub tool: String,
    pub known_paths: Vec<PathBuf>,
    pub resolver: Option<Resolver>,
    pub install_hint: String,
}

impl Locator {
    pub fn new(tool: impl Into<String>, install_hint: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            known_paths: Vec::new(),
            resolver: None,
            install_hint: install_hint.into(),
        }
    }

    pub fn known_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_paths.push(path.into());
        self
    }

    pub fn resolver(mut self, program: impl Into<PathBuf>, args: &[&str]) -> Self {
        self.resolver = Some(Resolver {
            program: program.into(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
        });
        self
    }

    /// `which <tool>` fallback.
    pub fn which(self) -> Self {
        let tool = self.tool.clone();
        self.resolver("/usr/bin/which", &[tool.as_str()])
    }

    fn not_installed(&self) -> AscError {
        AscError::NotInstalled {
            tool: self.tool.clone(),
            hint: self.install_hint.clone(),
        }
    }

    async fn locate(&self) -> Result<PathBuf, AscError> {
        for path in &self.known_paths {
            if is_executable(path).await {
                tracing::info!(tool = %self.tool, path = %path.display(), "found executable at known path");
                return Ok(path.clone());
            }
        }

        let Some(resolver) = &self.resolver else {
            tracing::error!(tool = %self.tool, "executable not found");
            return Err(self.not_installed());
        };

        tracing::debug!(tool = %self.tool, resolver = %resolver.program.display(), "known paths missed, asking resolver");
        let output = Command::new(&resolver.program)
            .args(&resolver.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match output {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                tracing::error!(tool = %self.tool, status = ?output.status.code(), "resolver could not find executable");
                return Err(self.not_installed());
            }
            Err(e) => {
                tracing::error!(tool = %self.tool, error = %e, "resolver failed to start");
                return Err(self.not_installed());
            }
        };

        let resolved = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(str::trim)
            .unwrap_or_default()
            .to_owned();
        if resolved.is_empty() {
            return Err(self.not_installed());
        }

        tracing::info!(tool = %self.tool, path = %resolved, "found executable via resolver");
        Ok(PathBuf::from(resolved))
    }
}

#[cfg(unix)]
async fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
async fn is_executable(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Runs one external tool. The resolved executable path is cached for the runner's lifetime and
/// never re-validated; build a new runner to force re-detection.
#[derive(Debug)]
pub struct ProcessRunner {
    locator: Locator,
    resolved: OnceCell<PathBuf>,
}

impl ProcessRunner {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            resolved: OnceCell::new(),
        }
    }

    pub fn tool(&self) -> &str {
        &self.locator.tool
    }

    pub async fn executable(&self) -> Result<&Path, AscError> {
        let path = self
            .resolved
            .get_or_try_init(|| self.locator.locate())
            .await?;
        Ok(path.as_path())
    }

    /// Run to completion and return whatever was captured, regardless of exit status.
    pub async fn output(&self, args: &[String]) -> Result<ProcessOutput, AscError> {
        let executable = self.executable().await?;
        tracing::info!(command = %self.describe(args), "running external command");

        let output = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AscError::io(format!("cannot start {}", executable.display()), e))?;

        let captured = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        if !captured.stderr.is_empty() {
            tracing::debug!(tool = %self.tool(), stderr = %preview(&captured.stderr), "stderr");
        }
        Ok(captured)
    }

    /// Run and require exit status 0. Stdout is never consulted to excuse a failure.
    pub async fn run(&self, args: &[String]) -> Result<ProcessOutput, AscError> {
        let output = self.output(args).await?;
        if !output.success() {
            tracing::error!(
                command = %self.describe(args),
                exit_code = output.exit_code,
                stderr = %preview(&output.stderr),
                "external command failed"
            );
            return Err(AscError::CommandFailed {
                command: self.describe(args),
                exit_code: output.exit_code,
            });
        }
        tracing::info!(tool = %self.tool(), "external command completed");
        Ok(output)
    }

    fn describe(&self, args: &[String]) -> String {
        if args.is_empty() {
            self.locator.tool.clone()
        } else {
            format!("{} {}", self.locator.tool, args.join(" "))
        }
    }
}

fn preview(text: &str) -> &str {
    const MAX: usize = 500;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(600);
        assert_eq!(preview(&long).chars().count(), 500);
        assert_eq!(preview("short"), "short");
    }

    #[tokio::test]
    async fn missing_tool_without_resolver_is_not_installed() {
        let runner = ProcessRunner::new(
            Locator::new("nope", "Install nope.").known_path("/definitely/not/here/nope"),
        );
        let err = runner.output(&[]).await.unwrap_err();
        assert!(matches!(err, AscError::NotInstalled { ref tool, .. } if tool == "nope"));
    }

    #[test]
    fn describe_joins_arguments() {
        let runner = ProcessRunner::new(Locator::new("firebase", ""));
        assert_eq!(
            runner.describe(&["projects:list".into(), "--json".into()]),
            "firebase projects:list --json"
        );
        assert_eq!(runner.describe(&[]), "firebase");
    }
}
