// src/main.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use juggle_tracker::config::{AnalysisConfig, Config};
use juggle_tracker::detection::{RecordingReader, ReplayDetector, ReplayPoseEstimator};
use juggle_tracker::pipeline::{CancellationToken, MetricsSummary, Pipeline};
use juggle_tracker::AnalysisResult;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "juggle-tracker",
    about = "Count juggling kicks, streaks and technique from recorded ball/pose detections"
)]
struct Args {
    /// Recording file or directory of recordings (default: input.input_dir)
    input: Option<PathBuf>,
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
    /// Write the JSON report here instead of stdout
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Override analysis.frame_skip
    #[arg(long)]
    frame_skip: Option<u32>,
}

#[derive(Debug, Serialize)]
struct RecordingReport {
    source: String,
    analyzed_at: DateTime<Utc>,
    result: AnalysisResult,
    metrics: MetricsSummary,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        Config::default()
    };
    if let Some(frame_skip) = args.frame_skip {
        config.analysis.frame_skip = frame_skip;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("juggle_tracker={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("⚽ Juggle tracker starting");
    if args.config.exists() {
        info!("✓ Configuration loaded from {}", args.config.display());
    } else {
        warn!("{} not found, using default configuration", args.config.display());
    }

    config
        .analysis
        .validate()
        .context("Invalid analysis configuration")?;

    let input = args
        .input
        .unwrap_or_else(|| PathBuf::from(&config.input.input_dir));
    let recordings = find_recordings(&input, &config.input.extension)?;

    if recordings.is_empty() {
        error!("No recordings found in {}", input.display());
        return Ok(());
    }
    info!("Found {} recording(s) to analyze", recordings.len());

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing with the frames seen so far");
                cancel.cancel();
            }
        });
    }

    // One independent pipeline per recording
    let jobs: Vec<_> = recordings
        .into_iter()
        .map(|path| {
            let analysis = config.analysis.clone();
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || analyze_recording(&path, analysis, &cancel))
        })
        .collect();

    let mut reports = Vec::new();
    for job in jobs {
        match job.await.context("Analysis task panicked")? {
            Ok(report) => {
                info!("✓ {}: {}", report.source, report.result.summary());
                reports.push(report);
            }
            Err(e) => error!("Failed to analyze recording: {:#}", e),
        }
    }

    let json = serde_json::to_string_pretty(&reports)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            info!("💾 Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn find_recordings(input: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.exists() {
        anyhow::bail!("Input {} does not exist", input.display());
    }

    let mut recordings: Vec<PathBuf> = WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    recordings.sort();

    Ok(recordings)
}

fn analyze_recording(
    path: &Path,
    config: AnalysisConfig,
    cancel: &CancellationToken,
) -> Result<RecordingReport> {
    info!("Analyzing {}", path.display());

    let reader = RecordingReader::open(path)?;
    let mut pipeline = Pipeline::new(config, ReplayDetector, ReplayPoseEstimator)?;
    let result = pipeline.analyze_until(reader, cancel);

    Ok(RecordingReport {
        source: path.display().to_string(),
        analyzed_at: Utc::now(),
        result,
        metrics: pipeline.metrics().summary(),
    })
}
