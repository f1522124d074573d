//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for itinex.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItinexConfig {
    /// Record extraction configuration.
    pub extraction: ExtractionConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Vendor profile configuration.
    pub profiles: ProfilesConfig,
}

/// Record extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Look for a total price in the document and attach it to reservations.
    pub extract_prices: bool,

    /// Produce one reservation per listed passenger.
    pub fan_out_passengers: bool,

    /// Maximum records per scan (0 = unlimited).
    pub max_records: usize,

    /// Locale for profiles that do not declare one.
    pub default_locale: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            extract_prices: true,
            fan_out_passengers: true,
            max_records: 0,
            default_locale: "en".to_string(),
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,

    /// Minimum text length to consider a PDF as text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            min_text_length: 50,
        }
    }
}

/// Where vendor profiles come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    /// Directory with additional `*.json` profiles.
    pub profile_dir: Option<PathBuf>,

    /// Load the profiles compiled into the binary.
    pub include_builtin: bool,

    /// Only use these profiles (empty = all).
    pub enabled: Vec<String>,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            profile_dir: None,
            include_builtin: true,
            enabled: Vec::new(),
        }
    }
}

impl ItinexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Whether the profile `name` is allowed by the `enabled` list.
    pub fn is_profile_enabled(&self, name: &str) -> bool {
        self.profiles.enabled.is_empty() || self.profiles.enabled.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ItinexConfig =
            serde_json::from_str(r#"{ "extraction": { "max_records": 5 } }"#).unwrap();
        assert_eq!(config.extraction.max_records, 5);
        assert!(config.extraction.extract_prices);
        assert_eq!(config.pdf, PdfConfig::default());
    }

    #[test]
    fn test_enabled_profiles() {
        let mut config = ItinexConfig::default();
        assert!(config.is_profile_enabled("anything"));

        config.profiles.enabled = vec!["db-ticket".to_string()];
        assert!(config.is_profile_enabled("db-ticket"));
        assert!(!config.is_profile_enabled("cd-ticket"));
    }
}
