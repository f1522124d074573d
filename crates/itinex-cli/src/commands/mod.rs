//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod profiles;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use itinex_core::models::config::{ItinexConfig, PdfConfig};
use itinex_core::pdf::{PdfExtractor, PdfType, is_pdf};

/// `<config dir>/itinex/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("itinex")
        .join("config.json")
}

/// The `--config` path if given, otherwise the default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration. A missing default config file means defaults;
/// a missing explicit one is an error.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<ItinexConfig> {
    if let Some(path) = explicit {
        return Ok(ItinexConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(ItinexConfig::from_file(&path)?)
    } else {
        Ok(ItinexConfig::default())
    }
}

/// Read a document as text. PDFs are recognized by their header, anything
/// else must be UTF-8.
pub fn read_document(path: &Path, pdf: &PdfConfig) -> anyhow::Result<String> {
    let data = fs::read(path)?;

    if !is_pdf(&data) {
        return String::from_utf8(data)
            .map_err(|_| anyhow::anyhow!("{} is neither a PDF nor UTF-8 text", path.display()));
    }

    let mut extractor = PdfExtractor::with_config(pdf);
    let content = extractor.extract_all(&data)?;
    debug!("{}: {} pages, {:?}", path.display(), content.page_count, content.pdf_type);

    if content.pdf_type == PdfType::Empty {
        anyhow::bail!(
            "{} has no text layer; scanned documents are not supported",
            path.display()
        );
    }
    Ok(content.text)
}
