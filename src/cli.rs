use chaptercut_media::SkipRange;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chaptercut")]
#[command(author, version, about = "Cut chapter ranges out of episodes and merge them into parts")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Host to bind to (config value if omitted)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (config value if omitted)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Process a folder of episodes in the foreground
    Process {
        /// Folder containing the episodes
        input: PathBuf,

        /// Folder receiving the merged parts
        output: PathBuf,

        /// Chapter range to remove, as START:END (repeatable, `\:` for a colon in END)
        #[arg(short, long = "skip", value_name = "START:END")]
        skips: Vec<SkipRange>,

        /// Number of output parts (config default if omitted)
        #[arg(long)]
        parts: Option<usize>,

        /// Audio track to mark as default in every part
        #[arg(long)]
        audio_index: Option<usize>,
    },

    /// Preview the chapters of the first episodes in a folder
    Scan {
        /// Folder to scan
        folder: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that ffmpeg and ffprobe are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_process() {
        let cli = Cli::try_parse_from([
            "chaptercut",
            "process",
            "/in",
            "/out",
            "--skip",
            "Intro:Episode",
            "-s",
            "Preview:End",
            "--parts",
            "3",
        ])
        .unwrap();

        match cli.command {
            Commands::Process {
                skips,
                parts,
                audio_index,
                ..
            } => {
                assert_eq!(
                    skips,
                    vec![
                        SkipRange::new("Intro", "Episode"),
                        SkipRange::new("Preview", "End")
                    ]
                );
                assert_eq!(parts, Some(3));
                assert_eq!(audio_index, None);
            }
            _ => panic!("expected process"),
        }
    }

    #[test]
    fn test_bad_skip_rejected() {
        assert!(Cli::try_parse_from(["chaptercut", "process", "/in", "/out", "--skip", "Intro"]).is_err());
    }
}
