//! Profiles command - inspect, validate and export vendor profiles.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use itinex_core::extract::{Extractor, Registry, builtin_names, builtin_source};
use itinex_core::models::profile::VendorProfile;

use super::{load_config, read_document};

/// Arguments for the profiles command.
#[derive(Args)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    command: ProfilesCommand,
}

#[derive(Subcommand)]
enum ProfilesCommand {
    /// List available profiles
    List {
        /// Directory with additional profiles
        #[arg(long)]
        profiles: Option<PathBuf>,
    },

    /// Print a profile as JSON
    Show {
        /// Profile name
        name: String,

        /// Directory with additional profiles
        #[arg(long)]
        profiles: Option<PathBuf>,
    },

    /// Compile profile files and report problems
    Check(CheckArgs),

    /// Write the built-in profiles to a directory
    Export(ExportArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Profile files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Run the profiles against this document and report what they find
    #[arg(short, long)]
    sample: Option<PathBuf>,
}

#[derive(Args)]
struct ExportArgs {
    /// Target directory
    dir: PathBuf,

    /// Overwrite existing files
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ProfilesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ProfilesCommand::List { profiles } => list_profiles(config_path, profiles),
        ProfilesCommand::Show { name, profiles } => show_profile(config_path, &name, profiles),
        ProfilesCommand::Check(check_args) => check_profiles(config_path, check_args),
        ProfilesCommand::Export(export_args) => export_profiles(export_args),
    }
}

fn load_registry(config_path: Option<&str>, dir: Option<PathBuf>) -> anyhow::Result<Registry> {
    let mut config = load_config(config_path)?;
    if dir.is_some() {
        config.profiles.profile_dir = dir;
    }
    Ok(Registry::from_config(&config)?)
}

fn list_profiles(config_path: Option<&str>, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let registry = load_registry(config_path, dir)?;

    for extractor in registry.iter() {
        let profile = extractor.profile();
        println!(
            "{} {:<8} {:<3} {:<9} {}",
            style(format!("{:<24}", profile.name)).bold(),
            profile.projection.kind.to_string(),
            extractor.locale().code(),
            if is_builtin(profile) { "built-in" } else { "custom" },
            profile.description.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

/// True if `profile` is an unmodified built-in profile.
fn is_builtin(profile: &VendorProfile) -> bool {
    builtin_source(&profile.name)
        .and_then(|json| VendorProfile::from_json(json).ok())
        .is_some_and(|builtin| &builtin == profile)
}

fn show_profile(config_path: Option<&str>, name: &str, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let registry = load_registry(config_path, dir)?;
    let extractor = registry
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("Unknown profile: {}", name))?;

    println!("{}", extractor.profile().to_json()?);
    Ok(())
}

fn check_profiles(config_path: Option<&str>, args: CheckArgs) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let sample = match &args.sample {
        Some(path) => Some(read_document(path, &config.pdf)?),
        None => None,
    };

    let mut failed = 0;
    for path in &args.files {
        let compiled = VendorProfile::from_file(path)
            .and_then(|profile| Extractor::compile_with_locale(profile, &config.extraction.default_locale));

        let extractor = match compiled {
            Ok(extractor) => extractor,
            Err(e) => {
                failed += 1;
                println!("{} {}: {}", style("✗").red(), path.display(), e);
                continue;
            }
        };

        println!("{} {} ({})", style("✓").green(), path.display(), extractor.name());

        if let Some(text) = &sample {
            let result = extractor.extract_with(text, &config.extraction);
            println!(
                "   {} records, {} reservations, {} errors, {} discarded",
                result.records.len(),
                result.reservations.len(),
                result.errors.len(),
                result.discarded
            );
            for reservation in &result.reservations {
                println!("   - {}", reservation.summary());
            }
            for error in &result.errors {
                println!("   {} record {}: {}", style("!").yellow(), error.record, error.message);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} profiles failed to compile", failed, args.files.len());
    }
    Ok(())
}

fn export_profiles(args: ExportArgs) -> anyhow::Result<()> {
    fs::create_dir_all(&args.dir)?;

    for name in builtin_names() {
        let Some(json) = builtin_source(name) else {
            continue;
        };
        let path = args.dir.join(format!("{}.json", name));
        if path.exists() && !args.force {
            println!("{} {} exists, skipping", style("ℹ").blue(), path.display());
            continue;
        }
        fs::write(&path, json)?;
        println!("{} Wrote {}", style("✓").green(), path.display());
    }

    Ok(())
}
