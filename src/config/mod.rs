mod types;

pub use types::*;

use anyhow::{Context, Result};
use chaptercut_av::FfmpegTool;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./chaptercut.toml",
        "./config.toml",
        "~/.config/chaptercut/config.toml",
        "/etc/chaptercut/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.processing.default_parts == 0 {
        anyhow::bail!("processing.default_parts must be at least 1");
    }

    if config.processing.extensions.is_empty() {
        anyhow::bail!("processing.extensions cannot be empty");
    }

    for (name, secs) in config.timeouts.entries() {
        if secs == 0 {
            anyhow::bail!("timeouts.{} cannot be 0", name);
        }
    }

    for tool in [&config.tools.ffmpeg, &config.tools.ffprobe] {
        if chaptercut_av::resolve_tool(tool).is_err() {
            tracing::warn!("Media tool not found: {}", tool);
        }
    }

    Ok(())
}

/// Build the media tool described by the config.
pub fn media_tool(config: &Config) -> FfmpegTool {
    FfmpegTool::new(
        &config.tools.ffmpeg,
        &config.tools.ffprobe,
        (&config.timeouts).into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.processing.extensions, vec!["mkv"]);
        assert_eq!(config.processing.default_parts, 1);
        assert!(config.processing.merge_segment_chapters);
        assert!(!config.processing.combine_subtitles);
        assert_eq!(config.timeouts.trim, 300);
        assert!(config.processing.concurrency() >= 1);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(
            r#"
[server]
port = 9000

[processing]
max_concurrent_episodes = 2
extensions = ["mkv", "mp4"]

[timeouts]
trim = 60
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.processing.concurrency(), 2);
        assert_eq!(config.processing.extensions.len(), 2);
        assert_eq!(config.timeouts.trim, 60);
        assert_eq!(config.timeouts.part_concat, 900);
    }

    #[test]
    fn test_rejects_zero_port() {
        let file = write_config("[server]\nport = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let file = write_config("[timeouts]\nprobe = 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("timeouts.probe"));
    }

    #[test]
    fn test_rejects_zero_parts() {
        let file = write_config("[processing]\ndefault_parts = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_timeouts_convert_to_durations() {
        let t: chaptercut_av::Timeouts = (&TimeoutsConfig::default()).into();
        assert_eq!(t, chaptercut_av::Timeouts::default());
    }
}
