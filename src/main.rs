//! CLI entry point for the form downloader tool.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use form_downloader::{DownloadOutcome, MultipartDownloader, Settings};
use serde::Serialize;
use tracing::{debug, info};

mod cli;

use cli::Args;

/// Machine-readable summary printed with `--json`.
#[derive(Debug, Serialize)]
struct Report {
    files: Vec<PathBuf>,
    bytes_written: u64,
    error: Option<String>,
}

impl From<&DownloadOutcome> for Report {
    fn from(outcome: &DownloadOutcome) -> Self {
        Self {
            files: outcome.paths.clone(),
            bytes_written: outcome.bytes_written,
            error: outcome.error.as_ref().map(ToString::to_string),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so stdout carries only the result.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            args.output_dir.display()
        )
    })?;

    let settings = Settings::new()
        .with_packet_size(args.packet_size)
        .with_operations_timeout(Duration::from_secs(args.timeout_secs))
        .with_output_directory(&args.output_dir)
        .on_file_body(|path| debug!(path = %path.display(), "file is downloaded"));
    let downloader = MultipartDownloader::new(settings);

    let outcome = if args.blocking {
        download_blocking(downloader, args.content_type.clone(), args.input.clone()).await?
    } else {
        download_async(&downloader, &args.content_type, args.input.as_deref()).await?
    };

    if args.json {
        let report = serde_json::to_string_pretty(&Report::from(&outcome))
            .context("failed to serialize report")?;
        println!("{report}");
    } else {
        for path in &outcome.paths {
            println!("{}", path.display());
        }
    }

    match &outcome.error {
        None => {
            info!(files = outcome.paths.len(), "Successfully downloaded files");
            Ok(ExitCode::SUCCESS)
        }
        Some(error) => {
            eprintln!("error: {error}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn download_blocking(
    downloader: MultipartDownloader,
    content_type: String,
    input: Option<PathBuf>,
) -> Result<DownloadOutcome> {
    tokio::task::spawn_blocking(move || -> Result<DownloadOutcome> {
        let outcome = match input {
            Some(path) => {
                let mut file = std::fs::File::open(&path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                downloader.download_blocking(&content_type, &mut file, b"")
            }
            None => downloader.download_blocking(&content_type, &mut std::io::stdin().lock(), b""),
        };
        Ok(outcome)
    })
    .await
    .context("blocking download task panicked")?
}

async fn download_async(
    downloader: &MultipartDownloader,
    content_type: &str,
    input: Option<&std::path::Path>,
) -> Result<DownloadOutcome> {
    let outcome = match input {
        Some(path) => {
            let mut file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            downloader.download(content_type, &mut file, b"", ()).await
        }
        None => {
            downloader
                .download(content_type, &mut tokio::io::stdin(), b"", ())
                .await
        }
    };
    Ok(outcome)
}
