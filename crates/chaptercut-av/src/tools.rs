//! External tool detection.

use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available using the given version argument.
///
/// `program` may be a bare name looked up on `PATH` or an explicit path.
///
/// # Example
///
/// ```no_run
/// use chaptercut_av::check_tool;
///
/// let info = check_tool("ffprobe", "-version");
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(program: &str, version_arg: &str) -> ToolInfo {
    let name = Path::new(program)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| program.to_string());

    match Command::new(program).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            ToolInfo {
                name,
                available: true,
                version,
                path: resolve_tool(program).ok(),
            }
        }
        _ => ToolInfo {
            name,
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check ffmpeg and ffprobe as configured.
pub fn check_tools(ffmpeg: &str, ffprobe: &str) -> Vec<ToolInfo> {
    vec![check_tool(ffmpeg, "-version"), check_tool(ffprobe, "-version")]
}

/// Require that a tool is available on `PATH`, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Resolve a configured tool: an existing explicit path wins, otherwise the
/// value is looked up on `PATH`.
pub fn resolve_tool(configured: &str) -> Result<PathBuf> {
    let path = Path::new(configured);
    if path.components().count() > 1 {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::tool_not_found(configured));
    }

    require_tool(configured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tool_not_found() {
        let info = check_tool("nonexistent_tool_12345", "-version");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
        assert_eq!(info.name, "nonexistent_tool_12345");
    }

    #[test]
    fn test_resolve_missing_explicit_path() {
        let err = resolve_tool("/definitely/not/here/ffmpeg").unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[test]
    fn test_resolve_existing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("ffmpeg");
        std::fs::write(&tool, "").unwrap();
        assert_eq!(resolve_tool(tool.to_str().unwrap()).unwrap(), tool);
    }
}
