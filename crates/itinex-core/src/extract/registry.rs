//! The set of compiled profiles an extraction run chooses from.

use std::path::Path;

use tracing::{debug, info};

use super::builtin::builtin_profiles;
use super::{ExtractionResult, Extractor};
use crate::error::{ProfileError, Result};
use crate::models::config::{ExtractionConfig, ItinexConfig};
use crate::models::profile::VendorProfile;

/// Compiled profiles, tried in registration order.
#[derive(Debug)]
pub struct Registry {
    extractors: Vec<Extractor>,
    default_locale: String,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
            default_locale: "en".to_string(),
        }
    }

    /// A registry holding every built-in profile.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        for profile in builtin_profiles()? {
            registry.add_profile(profile)?;
        }
        Ok(registry)
    }

    /// Build the registry described by `config`.
    ///
    /// Profiles from `profile_dir` come first and replace built-in profiles
    /// of the same name. The `enabled` list, when non-empty, filters both.
    pub fn from_config(config: &ItinexConfig) -> Result<Self> {
        let mut registry = Self {
            extractors: Vec::new(),
            default_locale: config.extraction.default_locale.clone(),
        };

        if let Some(dir) = &config.profiles.profile_dir {
            registry.load_dir(dir)?;
        }

        if config.profiles.include_builtin {
            for profile in builtin_profiles()? {
                if registry.get(&profile.name).is_some() {
                    debug!("Built-in profile {} overridden", profile.name);
                    continue;
                }
                registry.add_profile(profile)?;
            }
        }

        registry.extractors.retain(|e| config.is_profile_enabled(e.name()));
        info!("Loaded {} profiles", registry.len());
        Ok(registry)
    }

    /// Register a compiled extractor. Names must be unique.
    pub fn add(&mut self, extractor: Extractor) -> Result<()> {
        if self.get(extractor.name()).is_some() {
            return Err(ProfileError::Duplicate(extractor.name().to_string()).into());
        }
        self.extractors.push(extractor);
        Ok(())
    }

    /// Compile and register a profile.
    pub fn add_profile(&mut self, profile: VendorProfile) -> Result<()> {
        let extractor = Extractor::compile_with_locale(profile, &self.default_locale)?;
        self.add(extractor)
    }

    /// Load every `*.json` file in `dir`, in file name order.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in &paths {
            debug!("Loading profile {}", path.display());
            self.add_profile(VendorProfile::from_file(path)?)?;
        }
        Ok(paths.len())
    }

    pub fn get(&self, name: &str) -> Option<&Extractor> {
        self.extractors.iter().find(|e| e.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.extractors.iter().map(Extractor::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extractor> {
        self.extractors.iter()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Run profiles in order and return the first result with reservations.
    ///
    /// Profiles that only produced malformed records do not stop the search,
    /// but when no profile yields a reservation the first of them is
    /// returned so its errors reach the caller.
    pub fn extract(&self, text: &str, config: &ExtractionConfig) -> Option<ExtractionResult> {
        let mut malformed = None;
        for extractor in self.extractors.iter().filter(|e| e.applies_to(text)) {
            let result = extractor.extract_with(text, config);
            if result.has_reservations() {
                return Some(result);
            }
            if !result.is_empty() && malformed.is_none() {
                debug!("Profile {} produced only malformed records", result.profile);
                malformed = Some(result);
            }
        }
        malformed
    }

    /// Run every applicable profile and keep all non-empty results.
    pub fn extract_all(&self, text: &str, config: &ExtractionConfig) -> Vec<ExtractionResult> {
        self.extractors
            .iter()
            .filter(|e| e.applies_to(text))
            .map(|e| e.extract_with(text, config))
            .filter(|r| !r.is_empty())
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ItinexError;
    use crate::models::profile::{FieldDef, Projection, RecordDef, TimeSlot};
    use crate::models::reservation::ReservationKind;
    use tempfile::TempDir;

    fn profile(name: &str, trigger: &str) -> VendorProfile {
        VendorProfile {
            name: name.to_string(),
            description: None,
            locale: None,
            trigger: Some(trigger.to_string()),
            document_fields: Vec::new(),
            section: None,
            record: RecordDef {
                fields: vec![FieldDef::new(
                    "event",
                    r"Event: (?P<event>[^\n]+) on (?P<date>\d{4}-\d{2}-\d{2})",
                )],
                terminator: None,
            },
            passengers: None,
            projection: Projection {
                vehicle_number: Some("event".to_string()),
                start_time: Some(TimeSlot::new(&["date"], "%Y-%m-%d")),
                ..Projection::new(ReservationKind::Event)
            },
        }
    }

    fn train_profile(name: &str, json_fields: &str) -> VendorProfile {
        VendorProfile::from_json(&format!(
            r#"{{
                "name": "{name}",
                "trigger": "Train",
                "record": {{ "fields": [ {json_fields} ] }},
                "projection": {{
                    "kind": "train",
                    "vehicle_number": "train",
                    "origin": {{ "name": "from" }},
                    "destination": {{ "name": "to" }},
                    "start_time": {{ "fields": ["date", "dep"], "format": "%d.%m.%Y %H:%M" }}
                }}
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = Registry::new();
        registry.add_profile(profile("a", "A")).unwrap();
        let err = registry.add_profile(profile("a", "B")).unwrap_err();
        assert!(matches!(err, ItinexError::Profile(ProfileError::Duplicate(ref n)) if n == "a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_first_non_empty_result_wins() {
        let mut registry = Registry::new();
        registry.add_profile(profile("never", "Nope")).unwrap();
        registry.add_profile(profile("first", "Ticket")).unwrap();
        registry.add_profile(profile("second", "Ticket")).unwrap();

        let config = ExtractionConfig::default();
        let text = "Ticket\nEvent: Concert on 2024-06-01\n";
        let result = registry.extract(text, &config).unwrap();
        assert_eq!(result.profile, "first");
        assert_eq!(registry.extract_all(text, &config).len(), 2);
        assert!(registry.extract("nothing here", &config).is_none());
    }

    #[test]
    fn test_directory_overrides_builtin() {
        let builtin = Registry::with_builtin().unwrap();
        let name = builtin.names()[0].to_string();

        let dir = TempDir::new().unwrap();
        let json = profile(&name, "Override").to_json().unwrap();
        std::fs::write(dir.path().join("override.json"), json).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut config = ItinexConfig::default();
        config.profiles.profile_dir = Some(dir.path().to_path_buf());
        let registry = Registry::from_config(&config).unwrap();

        assert_eq!(registry.len(), builtin.len());
        assert_eq!(registry.names()[0], name);
        assert_eq!(registry.get(&name).unwrap().profile().trigger.as_deref(), Some("Override"));
    }

    #[test]
    fn test_enabled_filter() {
        let builtin = Registry::with_builtin().unwrap();
        let keep = builtin.names()[0].to_string();

        let mut config = ItinexConfig::default();
        config.profiles.enabled = vec![keep.clone()];
        let registry = Registry::from_config(&config).unwrap();
        assert_eq!(registry.names(), vec![keep.as_str()]);
    }

    #[test]
    fn test_malformed_records_reach_the_caller() {
        let mut registry = Registry::new();
        registry
            .add_profile(train_profile(
                "dated",
                r#"{ "name": "leg", "pattern": "Train (?P<train>\\w+) (?P<from>\\w+) - (?P<to>\\w+) (?P<date>\\d{2}\\.\\d{2}\\.\\d{4}) (?P<dep>\\d{2}:\\d{2})" }"#,
            ))
            .unwrap();

        let config = ExtractionConfig::default();
        let result = registry
            .extract("Train ICE123 Berlin - Hamburg 32.13.2024 10:05", &config)
            .unwrap();
        assert_eq!(result.profile, "dated");
        assert!(result.reservations.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].field, "date+dep");
        assert_eq!(registry.extract_all("Train ICE123 Berlin - Hamburg 32.13.2024 10:05", &config).len(), 1);
    }

    #[test]
    fn test_complete_result_beats_incomplete_and_malformed() {
        let mut registry = Registry::new();
        // Declares every key but only ever captures the train number.
        registry
            .add_profile(train_profile(
                "weak",
                r#"{ "name": "leg", "pattern": "Train (?P<train>\\w+)(?P<from>#)?(?P<to>#)?(?P<date>#)?(?P<dep>#)?" }"#,
            ))
            .unwrap();
        // Reads the date in the wrong order, so every record is malformed.
        registry
            .add_profile(train_profile(
                "swapped",
                r#"{ "name": "leg", "pattern": "Train (?P<train>\\w+) (?P<from>\\w+) - (?P<to>\\w+) (?P<dep>\\d{2}\\.\\d{2}\\.\\d{4}) (?P<date>\\d{2}:\\d{2})" }"#,
            ))
            .unwrap();
        registry
            .add_profile(train_profile(
                "good",
                r#"{ "name": "leg", "pattern": "Train (?P<train>\\w+) (?P<from>\\w+) - (?P<to>\\w+) (?P<date>\\d{2}\\.\\d{2}\\.\\d{4}) (?P<dep>\\d{2}:\\d{2})" }"#,
            ))
            .unwrap();

        let config = ExtractionConfig::default();
        let text = "Train ICE123 Berlin - Hamburg 15.03.2024 10:05";
        let result = registry.extract(text, &config).unwrap();
        assert_eq!(result.profile, "good");
        assert_eq!(result.reservations.len(), 1);
        assert!(result.errors.is_empty());

        let all: Vec<_> = registry
            .extract_all(text, &config)
            .into_iter()
            .map(|r| r.profile)
            .collect();
        assert_eq!(all, vec!["swapped", "good"]);
    }
}
