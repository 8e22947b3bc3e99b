//! Builder for executing external tool commands with a deadline.

use crate::{Error, Result};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// Stdout followed by stderr, the way an operator would see them.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.to_string(),
            (false, true) => stdout.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

/// A builder for constructing and executing external tool invocations.
///
/// The child is killed if the deadline passes or the future is dropped.
///
/// # Example
///
/// ```no_run
/// use chaptercut_av::ToolCommand;
/// use std::time::Duration;
///
/// # async fn example() -> chaptercut_av::Result<()> {
/// let output = ToolCommand::new("ffprobe")
///     .args(["-v", "error", "-show_chapters", "-of", "json"])
///     .arg("/path/to/episode.mkv")
///     .timeout(Duration::from_secs(30))
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program name or path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Arguments added so far.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the program cannot be spawned because it
    ///   does not exist.
    /// - [`Error::TimedOut`] if the deadline passes; the child is killed.
    /// - [`Error::ToolFailed`] on a non-zero exit, with the combined output.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let tool = self.program_name();
        tracing::debug!("Running {} {}", self.program.display(), self.args.join(" "));

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(tool.clone())
            } else {
                Error::tool_failed(tool.clone(), format!("failed to spawn: {e}"))
            }
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(Error::tool_failed(
                    tool,
                    format!("I/O error waiting for process: {e}"),
                ))
            }
            // Dropping the wait future drops the child, which kills it.
            Err(_elapsed) => {
                return Err(Error::TimedOut {
                    tool,
                    timeout: self.timeout,
                })
            }
        };

        let tool_output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            return Err(Error::tool_failed(
                tool,
                format!(
                    "exited with status {}: {}",
                    output.status,
                    tool_output.combined()
                ),
            ));
        }

        Ok(tool_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_echo() {
        let output = ToolCommand::new("echo").arg("hello").execute().await;

        match output {
            Ok(out) => {
                assert!(out.status.success());
                assert!(out.stdout.trim().contains("hello"));
            }
            Err(_) => {
                // On some minimal environments echo may not exist; skip.
            }
        }
    }

    #[tokio::test]
    async fn execute_nonexistent_tool() {
        let result = ToolCommand::new("nonexistent_tool_xyz_12345")
            .execute()
            .await;
        assert!(matches!(result, Err(Error::ToolNotFound { .. })));
    }

    #[tokio::test]
    async fn failure_carries_output() {
        let result = ToolCommand::new("sh")
            .args(["-c", "echo out; echo broken >&2; exit 3"])
            .execute()
            .await;

        match result {
            Err(Error::ToolFailed { tool, message }) => {
                assert_eq!(tool, "sh");
                assert!(message.contains("out"), "unexpected message: {message}");
                assert!(message.contains("broken"), "unexpected message: {message}");
            }
            Err(Error::ToolNotFound { .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_fires() {
        let result = ToolCommand::new("sleep")
            .arg("10")
            .timeout(Duration::from_millis(100))
            .execute()
            .await;
        let err = result.unwrap_err();
        if matches!(err, Error::ToolNotFound { .. }) {
            return;
        }
        assert!(err.is_timeout(), "unexpected error: {err}");
        assert!(err.to_string().contains("timed out"));
    }

    #[cfg(unix)]
    #[test]
    fn combined_output() {
        use std::os::unix::process::ExitStatusExt;
        let out = ToolOutput {
            status: ExitStatus::from_raw(0),
            stdout: "a\n".into(),
            stderr: "b\n".into(),
        };
        assert_eq!(out.combined(), "a\nb");
    }
}
