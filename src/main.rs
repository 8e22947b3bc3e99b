mod cli;

use chaptercut::{
    config,
    pipeline::{run_batch, BatchRequest, TrimOptions},
    scan, server, state,
};

use anyhow::Result;
use chaptercut_av::MediaTool;
use chaptercut_media::SkipRange;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;

async fn start_server(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting chaptercut server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let state = state::AppState::new();
    server::start_server(config, state).await
}

async fn process_folder(
    input: PathBuf,
    output: PathBuf,
    skips: Vec<SkipRange>,
    parts: Option<usize>,
    audio_index: Option<usize>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tool: Arc<dyn MediaTool> = Arc::new(config::media_tool(&config));
    let state = state::AppState::new();
    let tracker = state.start_run(&input, &output);

    let request = BatchRequest {
        input,
        output,
        options: TrimOptions {
            skip_ranges: skips,
            parts: parts.unwrap_or(0),
            audio_index,
        },
    };

    let result = run_batch(tool, &config.processing, &request, tracker.clone()).await;

    let progress = tracker.snapshot();
    println!("{}", serde_json::to_string_pretty(&progress)?);

    let report = result?;
    for part in &report.parts {
        println!("Wrote {}", part.display());
    }
    for subtitle in &report.subtitles {
        println!("Wrote {}", subtitle.display());
    }
    for failed in &report.failed_episodes {
        println!("Skipped {}: {}", failed.file.display(), failed.error);
    }
    for part in &report.failed_parts {
        println!("Part {} failed", part);
    }
    Ok(())
}

async fn scan_folder(folder: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tool = config::media_tool(&config);
    let result = scan::scan_folder(&tool, folder, &config.processing.extensions).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("First file: {}", result.first_file);
    println!("Episodes: {}", result.episode_count);
    println!("\nChapters:");
    for chapter in &result.chapters {
        println!("  {:>10.3}  {}", chapter.start, chapter.title);
    }
    println!("\nAudio Tracks: {}", result.audio_tracks.len());
    for track in &result.audio_tracks {
        let lang = if track.lang.is_empty() { "und" } else { &track.lang };
        print!("  [{}] {}", track.index, lang);
        if !track.title.is_empty() {
            print!(" - {}", track.title);
        }
        println!();
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    println!("Checking external tools...\n");

    let tools = chaptercut_av::check_tools(&config.tools.ffmpeg, &config.tools.ffprobe);
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to process episodes.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    // load_config validates what it reads
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            config::validate_config(&config)?;
            config
        }
    };

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!(
        "  Tools: {} / {}",
        config.tools.ffmpeg, config.tools.ffprobe
    );
    println!(
        "  Concurrent episodes: {}",
        config.processing.concurrency()
    );
    println!("  Default parts: {}", config.processing.default_parts);
    println!(
        "  Extensions: {}",
        config.processing.extensions.join(", ")
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "chaptercut=trace,chaptercut_av=debug,chaptercut_media=debug,tower_http=debug".to_string()
        } else {
            "chaptercut=info,chaptercut_av=info,chaptercut_media=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Process {
            input,
            output,
            skips,
            parts,
            audio_index,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(process_folder(
                input,
                output,
                skips,
                parts,
                audio_index,
                cli.config.as_deref(),
            ))
        }
        Commands::Scan { folder, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(scan_folder(&folder, json, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("chaptercut {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
