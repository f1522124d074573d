//! Extract command - reservations from a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use itinex_core::extract::{ExtractionResult, Registry};
use itinex_core::models::config::ItinexConfig;
use itinex_core::models::reservation::Reservation;

use super::{load_config, read_document};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Use only this profile
    #[arg(short, long)]
    profile: Option<String>,

    /// Directory with additional profiles
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Run every matching profile instead of stopping at the first result
    #[arg(long)]
    all: bool,

    /// Include raw records and per-record errors (JSON only)
    #[arg(long)]
    records: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per reservation
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.profiles {
        config.profiles.profile_dir = Some(dir.clone());
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);

    pb.set_message("Loading profiles...");
    let registry = registry_for(&config, args.profile.as_deref())?;

    pb.set_message("Reading document...");
    let text = read_document(&args.input, &config.pdf)?;
    if text.trim().is_empty() {
        anyhow::bail!("No text could be read from {}", args.input.display());
    }

    pb.set_message("Extracting reservations...");
    let results = if args.all {
        registry.extract_all(&text, &config.extraction)
    } else {
        registry.extract(&text, &config.extraction).into_iter().collect()
    };

    pb.finish_and_clear();

    if results.iter().all(|r| !r.has_reservations()) {
        eprintln!("{} No reservations found in {}", style("!").yellow(), args.input.display());
    }
    for result in &results {
        for error in &result.errors {
            eprintln!(
                "{} {}: record {}: {}",
                style("!").yellow(),
                result.profile,
                error.record,
                error.message
            );
        }
    }

    let output = format_results(&results, args.format, args.records)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!("{} Output written to {}", style("✓").green(), output_path.display());
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// The registry from `config`, narrowed to `profile` when one is named.
pub fn registry_for(config: &ItinexConfig, profile: Option<&str>) -> anyhow::Result<Registry> {
    let mut config = config.clone();
    if let Some(name) = profile {
        config.profiles.enabled = vec![name.to_string()];
    }

    let registry = Registry::from_config(&config)?;
    if let Some(name) = profile {
        if registry.is_empty() {
            anyhow::bail!("Unknown profile: {}", name);
        }
    }
    Ok(registry)
}

fn reservations(results: &[ExtractionResult]) -> impl Iterator<Item = (&str, &Reservation)> {
    results
        .iter()
        .flat_map(|r| r.reservations.iter().map(move |res| (r.profile.as_str(), res)))
}

pub fn format_results(results: &[ExtractionResult], format: OutputFormat, records: bool) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if records => Ok(serde_json::to_string_pretty(results)?),
        OutputFormat::Json => {
            let all: Vec<&Reservation> = reservations(results).map(|(_, r)| r).collect();
            Ok(serde_json::to_string_pretty(&all)?)
        }
        OutputFormat::Csv => format_csv(results),
        OutputFormat::Text => Ok(format_text(results)),
    }
}

fn format_csv(results: &[ExtractionResult]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "profile",
        "type",
        "reservation_number",
        "passenger",
        "start_time",
        "end_time",
        "summary",
        "total_price",
        "currency",
    ])?;

    let time = |t: Option<chrono::NaiveDateTime>| t.map(|t| t.format("%Y-%m-%dT%H:%M").to_string()).unwrap_or_default();
    for (profile, reservation) in reservations(results) {
        let info = reservation.info();
        wtr.write_record([
            profile.to_string(),
            reservation.kind().type_name().to_string(),
            reservation.reservation_number().unwrap_or_default().to_string(),
            reservation.passenger().unwrap_or_default().to_string(),
            time(reservation.start_time()),
            time(reservation.end_time()),
            reservation.summary(),
            info.total_price.map(|p| p.to_string()).unwrap_or_default(),
            info.price_currency.clone().unwrap_or_default(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(results: &[ExtractionResult]) -> String {
    let mut output = String::new();

    for result in results {
        output.push_str(&format!("Profile: {}\n", result.profile));
        for reservation in &result.reservations {
            output.push_str(&format!("  {}\n", reservation.summary()));
            if let Some(number) = reservation.reservation_number() {
                output.push_str(&format!("    Booking: {}\n", number));
            }
            if let Some(passenger) = reservation.passenger() {
                output.push_str(&format!("    Passenger: {}\n", passenger));
            }
            let info = reservation.info();
            if let (Some(price), Some(currency)) = (info.total_price, &info.price_currency) {
                output.push_str(&format!("    Price: {} {}\n", price, currency));
            }
        }
        if !result.errors.is_empty() {
            output.push_str(&format!("  {} records could not be read\n", result.errors.len()));
        }
        if result.discarded > 0 {
            output.push_str(&format!("  {} incomplete reservations dropped\n", result.discarded));
        }
        output.push('\n');
    }

    output
}
