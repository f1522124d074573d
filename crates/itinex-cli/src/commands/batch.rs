//! Batch command - extract reservations from many documents concurrently.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use itinex_core::extract::{ExtractionResult, Registry};
use itinex_core::models::config::ItinexConfig;

use super::extract::{OutputFormat, format_results, registry_for};
use super::{load_config, read_document};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Use only this profile
    #[arg(short, long)]
    profile: Option<String>,

    /// Directory with additional profiles
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.profiles {
        config.profiles.profile_dir = Some(dir.clone());
    }

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt" | "text")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!("{} Found {} files to process", style("ℹ").blue(), files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let registry = Arc::new(registry_for(&config, args.profile.as_deref())?);
    let config = Arc::new(config);

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let registry = Arc::clone(&registry);
        let config = Arc::clone(&config);
        let pb = overall_pb.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();
            let outcome = process_single_file(&path, &registry, &config);
            let processing_time_ms = file_start.elapsed().as_millis() as u64;
            pb.inc(1);

            match outcome {
                Ok(result) => FileResult {
                    path,
                    result,
                    error: None,
                    processing_time_ms,
                },
                Err(e) => FileResult {
                    path,
                    result: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                },
            }
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await?);
    }

    overall_pb.finish_and_clear();

    // Outputs of the files that worked are kept even when the run fails.
    if let Some(output_dir) = &args.output_dir {
        for file in &results {
            let Some(result) = file.result.as_ref().filter(|r| r.has_reservations()) else {
                continue;
            };
            let output_name = file.path.file_stem().and_then(|s| s.to_str()).unwrap_or("document");
            let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            let content = format_results(std::slice::from_ref(result), args.format, false)?;
            fs::write(&output_path, content)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!("{} Summary written to {}", style("✓").green(), summary_path.display());
    }

    for file in results.iter().filter(|r| r.error.is_some()) {
        let message = file.error.as_deref().unwrap_or("unknown error");
        if args.continue_on_error {
            warn!("Failed to process {}: {}", file.path.display(), message);
        } else {
            error!("Failed to process {}: {}", file.path.display(), message);
            anyhow::bail!("Processing failed: {}: {}", file.path.display(), message);
        }
    }

    let found = results
        .iter()
        .filter(|r| r.result.as_ref().is_some_and(|r| r.has_reservations()))
        .count();
    let empty = results.iter().filter(|r| r.error.is_none()).count() - found;
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} with reservations, {} without, {} failed",
        style(found).green(),
        style(empty).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    registry: &Registry,
    config: &ItinexConfig,
) -> anyhow::Result<Option<ExtractionResult>> {
    let text = read_document(path, &config.pdf)?;
    if text.trim().is_empty() {
        anyhow::bail!("No text extracted");
    }
    Ok(registry.extract(&text, &config.extraction))
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "profile",
        "reservations",
        "reservation_number",
        "start_time",
        "record_errors",
        "processing_time_ms",
        "error",
    ])?;

    for file in results {
        let filename = file.path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let time = file.processing_time_ms.to_string();

        match (&file.result, &file.error) {
            (Some(result), _) => {
                let first = result.reservations.first();
                let status = if result.has_reservations() { "success" } else { "malformed" };
                wtr.write_record([
                    filename,
                    status,
                    &result.profile,
                    &result.reservations.len().to_string(),
                    first.and_then(|r| r.reservation_number()).unwrap_or(""),
                    &first
                        .and_then(|r| r.start_time())
                        .map(|t| t.format("%Y-%m-%dT%H:%M").to_string())
                        .unwrap_or_default(),
                    &result.errors.len().to_string(),
                    &time,
                    "",
                ])?;
            }
            (None, Some(error)) => {
                wtr.write_record([filename, "error", "", "", "", "", "", &time, error])?;
            }
            (None, None) => {
                wtr.write_record([filename, "empty", "", "", "", "", "", &time, ""])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
