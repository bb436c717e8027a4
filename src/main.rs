//! Clipstack - Automated Short-Video Workflow
//!
//! Command-line entry point: loads the configuration, prepares the working
//! directories and dispatches to the pipeline steps.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clipstack::cli::{Args, Commands};
use clipstack::config::Config;
use clipstack::download::{VideoDownloader, YtDlpDownloader};
use clipstack::error::ClipError;
use clipstack::setup::SetupManager;
use clipstack::subtitle::write_srt;
use clipstack::transcribe::TranscriberFactory;
use clipstack::workflow::{caption_chunks, TrimJob, Workflow};

const DEFAULT_CONFIG_FILE: &str = "clipstack.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;
    info!("Starting clipstack");

    if let Commands::InitConfig { path, force } = &args.command {
        return init_config(path, *force);
    }

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    SetupManager::initialize(&config)?;
    let workflow = Workflow::new(config.clone());

    match args.command {
        Commands::Process(process) => {
            workflow.check_dependencies().await?;

            let job = process.to_job_request(config.media.chunk_length_secs);
            let output = workflow.run(&job).await?;

            match output.final_video {
                Some(path) => println!("Final video: {}", path.display()),
                None => {
                    println!("Chunks:");
                    for chunk in &output.chunk_files {
                        println!("  {}", chunk.display());
                    }
                }
            }
        }
        Commands::Download { url, output_dir } => {
            let dir = output_dir.unwrap_or_else(|| config.paths.upload_dir.clone());
            let downloader = YtDlpDownloader::new(config.downloader.clone());
            let path = downloader.download(&url, &dir).await?;
            println!("{}", path.display());
        }
        Commands::Trim { input, start, end, output } => {
            workflow.trim_many(vec![TrimJob { input, start, end, output }]).await?;
        }
        Commands::TrimBatch { manifest } => {
            let content = std::fs::read_to_string(&manifest).map_err(|e| {
                ClipError::Config(format!(
                    "Failed to read manifest {}: {}",
                    manifest.display(),
                    e
                ))
            })?;
            let jobs: Vec<TrimJob> = serde_json::from_str(&content).map_err(ClipError::Json)?;

            info!("Trimming {} videos in parallel", jobs.len());
            let outputs = workflow.trim_many(jobs).await?;
            for output in outputs {
                println!("{}", output.display());
            }
        }
        Commands::Transcribe { input, output, words_per_sub } => {
            let words_per_sub = words_per_sub.unwrap_or(config.subtitle.words_per_sub);
            let transcriber = TranscriberFactory::create_default(config.transcriber.clone());

            let transcription = transcriber.transcribe(&input).await?;
            let chunks = caption_chunks(&transcription.segments, words_per_sub)?;
            write_srt(&chunks, &output).await?;
            println!("Wrote {} captions to {}", chunks.len(), output.display());
        }
        Commands::Burn { video, subtitles, output } => {
            workflow.media().burn_subtitles(&video, &subtitles, &output).await?;
        }
        Commands::Stack { top, bottom, output } => {
            workflow.media().stack_vertical(&top, &bottom, &output).await?;
        }
        Commands::Zoom { input, output } => {
            let layout = workflow.media().create_vertical_zoom(&input, &output).await?;
            println!("Applied {} layout -> {}", layout, output.display());
        }
        Commands::Split { input, chunk_length, output_dir } => {
            let chunk_length = chunk_length.unwrap_or(config.media.chunk_length_secs);
            let chunks = workflow.split(&input, chunk_length, &output_dir).await?;
            for chunk in chunks {
                println!("{}", chunk.display());
            }
        }
        Commands::Bottoms => {
            let videos = workflow.list_bottom_videos();
            if videos.is_empty() {
                println!(
                    "No bottom videos found in {}",
                    config.paths.bottom_videos_dir.display()
                );
            } else {
                for name in videos {
                    println!("{}", name);
                }
            }
        }
        Commands::Doctor => {
            let statuses = SetupManager::check_tools(&config).await;
            println!("{:<10} {:<10} {:<30} {}", "Tool", "Status", "Binary", "Detail");
            println!("{}", "-".repeat(80));
            for status in &statuses {
                println!(
                    "{:<10} {:<10} {:<30} {}",
                    status.name,
                    if status.available { "OK" } else { "Missing" },
                    status.binary_path,
                    status.detail
                );
            }
            if statuses.iter().any(|s| !s.available) {
                anyhow::bail!("Some external tools are not available");
            }
        }
        Commands::InitConfig { .. } => unreachable!("handled before configuration is loaded"),
    }

    info!("clipstack completed successfully");
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().save_to_file(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".clipstack").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotated log file
    let file_appender = rolling::daily(&log_dir, "clipstack.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("clipstack.log").display()
    );

    Ok(())
}
