//! Profile-driven reservation extraction.
//!
//! An [`Extractor`] is a compiled [`VendorProfile`]: its patterns are
//! checked once up front, and every call to [`Extractor::extract`] runs the
//! same pipeline over a document:
//!
//! 1. check the trigger,
//! 2. match the document-wide fields,
//! 3. split the text into sections and scan each for records,
//! 4. project records into reservations,
//! 5. drop incomplete reservations and merge duplicates,
//! 6. attach the price and fan out per passenger.

mod builtin;
mod postprocess;
mod registry;

pub use builtin::{builtin_names, builtin_profiles, builtin_source};
pub use postprocess::{is_same, is_valid, postprocess};
pub use registry::Registry;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{FieldError, ProfileError, Result};
use crate::models::config::ExtractionConfig;
use crate::models::profile::{FieldDef, VendorProfile};
use crate::models::reservation::Reservation;
use crate::price::apply_price;
use crate::project::{FieldProjector, Locale, normalize_whitespace};
use crate::scan::{
    Fallback, FieldPattern, FieldSpec, Matcher, Presence, Record, RecordAssembler, ScanState, Scanner, expand_with,
};

/// A projection failure for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordError {
    /// Index of the record in [`ExtractionResult::records`].
    pub record: usize,
    pub field: String,
    pub message: String,
}

impl RecordError {
    fn new(record: usize, error: FieldError) -> Self {
        let message = error.to_string();
        let FieldError::Malformed { field, .. } = error;
        Self {
            record,
            field,
            message,
        }
    }
}

/// Everything one profile found in one document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Name of the profile that produced the result.
    pub profile: String,
    /// Assembled records, in document order.
    pub records: Vec<Record>,
    /// Projected reservations, in travel order.
    pub reservations: Vec<Reservation>,
    /// Records that could not be projected.
    pub errors: Vec<RecordError>,
    /// Reservations dropped as incomplete.
    pub discarded: usize,
    /// `Failed` if any section scan was aborted.
    pub state: ScanState,
}

impl ExtractionResult {
    fn empty(profile: &str) -> Self {
        Self {
            profile: profile.to_string(),
            records: Vec::new(),
            reservations: Vec::new(),
            errors: Vec::new(),
            discarded: 0,
            state: ScanState::Done,
        }
    }

    /// True when the profile found neither reservations nor malformed
    /// records. Not an error.
    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty() && self.errors.is_empty()
    }

    pub fn has_reservations(&self) -> bool {
        !self.reservations.is_empty()
    }
}

#[derive(Debug)]
struct Sections {
    start: FieldPattern,
    end: Option<FieldPattern>,
}

/// A compiled vendor profile.
#[derive(Debug)]
pub struct Extractor {
    profile: VendorProfile,
    locale: &'static Locale,
    trigger: Option<FieldPattern>,
    document: Vec<FieldSpec>,
    sections: Option<Sections>,
    assembler: RecordAssembler,
    passengers: Option<FieldPattern>,
}

impl Extractor {
    /// Compile a profile, defaulting to English month names.
    pub fn compile(profile: VendorProfile) -> Result<Self> {
        Self::compile_with_locale(profile, "en")
    }

    /// Compile a profile. `default_locale` applies when the profile names none.
    ///
    /// Fails on invalid regular expressions, unknown locales, empty records
    /// and projection slots that refer to keys no field produces.
    pub fn compile_with_locale(profile: VendorProfile, default_locale: &str) -> Result<Self> {
        let locale_code = profile.locale.as_deref().unwrap_or(default_locale);
        let locale = Locale::get(locale_code).ok_or_else(|| ProfileError::UnknownLocale {
            profile: profile.name.clone(),
            locale: locale_code.to_string(),
        })?;

        if profile.record.fields.is_empty() {
            return Err(ProfileError::EmptyRecord(profile.name.clone()).into());
        }

        let trigger = profile
            .trigger
            .as_deref()
            .map(|p| FieldPattern::new("trigger", p))
            .transpose()?;

        let document = profile
            .document_fields
            .iter()
            .map(field_spec)
            .collect::<Result<Vec<_>>>()?;

        let sections = match &profile.section {
            Some(def) => Some(Sections {
                start: FieldPattern::new("section", &def.start)?,
                end: def.end.as_deref().map(|p| FieldPattern::new("section_end", p)).transpose()?,
            }),
            None => None,
        };

        let mut assembler = RecordAssembler::new();
        for def in &profile.record.fields {
            assembler = assembler.field(field_spec(def)?);
        }
        if let Some(terminator) = &profile.record.terminator {
            assembler = assembler.with_terminator(FieldPattern::new("terminator", terminator)?);
        }

        let passengers = profile
            .passengers
            .as_deref()
            .map(|p| FieldPattern::new("passenger", p))
            .transpose()?;

        let extractor = Self {
            profile,
            locale,
            trigger,
            document,
            sections,
            assembler,
            passengers,
        };
        extractor.check_keys()?;

        debug!("Compiled profile {}", extractor.name());
        Ok(extractor)
    }

    /// Every projection slot and `fallback_from` source must name a key
    /// some record, document or section field produces.
    fn check_keys(&self) -> Result<()> {
        let mut known = self.assembler.output_keys();
        for spec in &self.document {
            known.extend(spec.output_keys());
        }
        if let Some(sections) = &self.sections {
            known.extend(sections.start.output_keys());
        }

        let unknown = |slot: String, key: String| ProfileError::UnknownKey {
            profile: self.profile.name.clone(),
            slot,
            key,
        };

        for (slot, key) in self.profile.projection.references() {
            if slot == "passenger" && self.passengers.is_some() {
                continue;
            }
            if !known.contains(&key) {
                return Err(unknown(slot, key).into());
            }
        }

        for spec in self.assembler.fields().iter().chain(&self.document) {
            for (key, fallback) in spec.fallbacks() {
                if let Fallback::Field(source) = fallback {
                    if !known.contains(source) {
                        let slot = format!("{}.fallback_from.{}", spec.name(), key);
                        return Err(unknown(slot, source.clone()).into());
                    }
                }
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn profile(&self) -> &VendorProfile {
        &self.profile
    }

    pub fn locale(&self) -> &'static Locale {
        self.locale
    }

    /// Whether the profile's trigger occurs in `text`. Profiles without a
    /// trigger apply to every document.
    pub fn applies_to(&self, text: &str) -> bool {
        self.trigger.as_ref().is_none_or(|t| t.is_match(text))
    }

    /// Extract with the default configuration.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        self.extract_with(text, &ExtractionConfig::default())
    }

    pub fn extract_with(&self, text: &str, config: &ExtractionConfig) -> ExtractionResult {
        if !self.applies_to(text) {
            debug!("Profile {} not triggered", self.name());
            return ExtractionResult::empty(self.name());
        }

        let mut shared = Record::default();
        for spec in &self.document {
            if !spec.fill(text, &mut shared) && spec.presence() == Presence::Required {
                debug!("Profile {}: document field {} not found", self.name(), spec.name());
                return ExtractionResult::empty(self.name());
            }
        }

        let (mut records, state) = self.scan_records(text, config.max_records);
        for record in &mut records {
            for (key, value) in shared.iter() {
                record.insert_missing(key, value);
            }
            // Sources that only exist at document or section level.
            self.assembler.resolve_field_fallbacks(record);
        }

        let projector = FieldProjector::new(&self.profile.projection, self.locale);
        let mut reservations = Vec::with_capacity(records.len());
        let mut errors = Vec::new();
        for (index, record) in records.iter().enumerate() {
            match projector.project(record) {
                Ok(reservation) => reservations.push(reservation),
                Err(e) => {
                    warn!("Profile {}: record {}: {}", self.name(), index, e);
                    errors.push(RecordError::new(index, e));
                }
            }
        }

        let (mut reservations, discarded) = postprocess(reservations);

        if config.extract_prices {
            apply_price(&mut reservations, text);
        }

        if config.fan_out_passengers {
            let names = self.passenger_names(text);
            if !names.is_empty() {
                reservations = reservations
                    .iter()
                    .flat_map(|r| expand_with(r, &names, |r, name| r.set_passenger(name.as_str())))
                    .collect();
            }
        }

        info!(
            "Profile {}: {} records, {} reservations, {} errors, {} discarded",
            self.name(),
            records.len(),
            reservations.len(),
            errors.len(),
            discarded
        );

        ExtractionResult {
            profile: self.name().to_string(),
            records,
            reservations,
            errors,
            discarded,
            state,
        }
    }

    /// Split the text into sections and scan each one for records.
    fn scan_records(&self, text: &str, limit: usize) -> (Vec<Record>, ScanState) {
        let scanner = Scanner::new(&self.assembler).with_limit(limit);

        let Some(sections) = &self.sections else {
            let outcome = scanner.scan(text);
            return (outcome.records, outcome.state);
        };

        let header_assembler = RecordAssembler::new().field(FieldSpec::required(sections.start.clone()));
        let headers = Scanner::new(&header_assembler).scan(text).records;
        debug!("Profile {}: {} sections", self.name(), headers.len());

        let mut records = Vec::new();
        let mut state = ScanState::Done;
        for (i, header) in headers.iter().enumerate() {
            let from = header.span().end;
            let to = match headers.get(i + 1) {
                Some(next) => next.span().start,
                None => sections
                    .end
                    .as_ref()
                    .and_then(|end| end.find(&text[from..]))
                    .map_or(text.len(), |m| from + m.start()),
            };

            let outcome = scanner.scan_from(&text[..to], from);
            if outcome.is_failed() {
                state = ScanState::Failed;
            }
            for mut record in outcome.records {
                for (key, value) in header.iter() {
                    if key != "section" {
                        record.insert_missing(key, value);
                    }
                }
                records.push(record);
            }

            if limit > 0 && records.len() >= limit {
                records.truncate(limit);
                break;
            }
        }

        (records, state)
    }

    /// Distinct passenger names, in document order.
    fn passenger_names(&self, text: &str) -> Vec<String> {
        let Some(pattern) = &self.passengers else {
            return Vec::new();
        };

        let assembler = RecordAssembler::new().field(FieldSpec::required(pattern.clone()));
        let mut names: Vec<String> = Vec::new();
        for record in Scanner::new(&assembler).scan(text).records {
            let Some(name) = record.text("name").or_else(|| record.text("passenger")) else {
                continue;
            };
            let name = normalize_whitespace(&name);
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

fn field_spec(def: &FieldDef) -> Result<FieldSpec> {
    let pattern = FieldPattern::new(def.name.as_str(), &def.pattern)?;
    let mut spec = if def.optional {
        FieldSpec::optional(pattern)
    } else {
        FieldSpec::required(pattern)
    }
    .with_scope(def.scope);

    for (key, value) in &def.defaults {
        spec = spec.with_default(key.as_str(), value.as_str());
    }
    for (key, source) in &def.fallback_from {
        spec = spec.with_fallback_field(key.as_str(), source.as_str());
    }
    for key in &def.carry {
        spec = spec.with_carry(key.as_str());
    }
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ItinexError;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const BUS: &str = r#"{
        "name": "test-bus",
        "trigger": "Coachline",
        "document_fields": [
            { "name": "booking", "pattern": "Booking: (?P<booking>[A-Z0-9]{6})" }
        ],
        "record": {
            "fields": [
                { "name": "dep", "pattern": "(?P<date>\\d{2}\\.\\d{2}\\.\\d{4}) (?P<dep>\\d{2}:\\d{2}) (?P<from>[^\\n]+)" },
                { "name": "arr", "pattern": "(?P<arr>\\d{2}:\\d{2}) (?P<to>[^\\n]+)" }
            ],
            "terminator": "Terms and conditions"
        },
        "passengers": "Passenger: (?P<name>[^\\n]+)",
        "projection": {
            "kind": "bus",
            "reservation_number": "booking",
            "origin": { "name": "from" },
            "destination": { "name": "to" },
            "start_time": { "fields": ["date", "dep"], "format": "%d.%m.%Y %H:%M" },
            "end_time": { "fields": ["date", "arr"], "format": "%d.%m.%Y %H:%M" }
        }
    }"#;

    const TICKET: &str = "Coachline e-ticket\n\
        Booking: QX7K2M\n\
        Passenger: Jane Doe\n\
        Passenger: John Doe\n\
        12.05.2024 08:15 Praha\n\
        11:40 Brno\n\
        13.05.2024 17:00 Brno\n\
        20:25 Praha\n\
        Total 498 Kč\n\
        Terms and conditions\n\
        01.01.2000 00:00 Nowhere\n\
        00:01 Elsewhere\n";

    fn compile(json: &str) -> Result<Extractor> {
        Extractor::compile(VendorProfile::from_json(json)?)
    }

    #[test]
    fn test_end_to_end() {
        let extractor = compile(BUS).unwrap();
        let result = extractor.extract(TICKET);

        assert_eq!(result.records.len(), 2);
        assert!(result.errors.is_empty());
        // Two legs times two passengers.
        assert_eq!(result.reservations.len(), 4);

        let first = &result.reservations[0];
        assert_eq!(first.reservation_number(), Some("QX7K2M"));
        assert_eq!(first.passenger(), Some("Jane Doe"));
        assert_eq!(result.reservations[1].passenger(), Some("John Doe"));
        assert_eq!(
            first.start_time(),
            NaiveDate::from_ymd_opt(2024, 5, 12).unwrap().and_hms_opt(8, 15, 0)
        );
        assert_eq!(
            result.reservations[3].end_time(),
            NaiveDate::from_ymd_opt(2024, 5, 13).unwrap().and_hms_opt(20, 25, 0)
        );
        // One price in the document, so every leg gets it.
        assert_eq!(first.info().price_currency.as_deref(), Some("CZK"));
        assert_eq!(first.info().total_price, Some(rust_decimal::Decimal::new(498, 0)));
    }

    #[test]
    fn test_price_applies_to_single_reservation() {
        let extractor = compile(BUS).unwrap();
        let text = "Coachline\nBooking: QX7K2M\n12.05.2024 08:15 Praha\n11:40 Brno\nTotal 249 Kč\n";
        let config = ExtractionConfig {
            fan_out_passengers: false,
            ..Default::default()
        };

        let result = extractor.extract_with(text, &config);
        assert_eq!(result.reservations.len(), 1);
        let info = result.reservations[0].info();
        assert_eq!(info.total_price, Some(rust_decimal::Decimal::new(249, 0)));
        assert_eq!(info.price_currency.as_deref(), Some("CZK"));
    }

    #[test]
    fn test_trigger_and_missing_document_field() {
        let extractor = compile(BUS).unwrap();
        assert!(extractor.extract("12.05.2024 08:15 Praha\n11:40 Brno\n").is_empty());
        assert!(extractor.extract("Coachline\n12.05.2024 08:15 Praha\n11:40 Brno\n").is_empty());
    }

    #[test]
    fn test_malformed_record_is_reported_not_fatal() {
        let extractor = compile(BUS).unwrap();
        let text = "Coachline\nBooking: QX7K2M\n\
            32.05.2024 08:15 Praha\n11:40 Brno\n\
            13.05.2024 17:00 Brno\n20:25 Praha\n";

        let result = extractor.extract(text);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.reservations.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].record, 0);
        assert_eq!(result.errors[0].field, "date+dep");
    }

    #[test]
    fn test_sections_merge_header_fields() {
        let json = r#"{
            "name": "test-sections",
            "section": { "start": "(?P<direction>Outward|Return) journey", "end": "Conditions" },
            "record": {
                "fields": [
                    { "name": "train", "pattern": "Train (?P<train>\\w+ \\d+)" }
                ]
            },
            "projection": { "kind": "train", "vehicle_number": "train" }
        }"#;
        let text = "Outward journey\nTrain ICE 1\nTrain RE 2\n\
            Return journey\nTrain IC 3\nConditions\nTrain XX 9\n";

        let result = compile(json).unwrap().extract(text);
        let trains: Vec<_> = result.records.iter().map(|r| r.text("train").unwrap().into_owned()).collect();
        assert_eq!(trains, vec!["ICE 1", "RE 2", "IC 3"]);
        assert_eq!(result.records[1].text("direction").as_deref(), Some("Outward"));
        assert_eq!(result.records[2].text("direction").as_deref(), Some("Return"));
    }

    #[test]
    fn test_compile_rejects_unknown_key() {
        let json = BUS.replace(r#""reservation_number": "booking""#, r#""reservation_number": "pnr""#);
        let err = compile(&json).unwrap_err();
        assert!(matches!(
            err,
            ItinexError::Profile(ProfileError::UnknownKey { ref key, .. }) if key == "pnr"
        ));
    }

    #[test]
    fn test_compile_rejects_bad_pattern() {
        let json = BUS.replace("Coachline", "Coach(line");
        assert!(matches!(compile(&json).unwrap_err(), ItinexError::Pattern(_)));
    }

    #[test]
    fn test_compile_rejects_unknown_locale() {
        let json = BUS.replace(r#""name": "test-bus","#, r#""name": "test-bus", "locale": "xx","#);
        assert!(matches!(
            compile(&json).unwrap_err(),
            ItinexError::Profile(ProfileError::UnknownLocale { .. })
        ));
    }

    #[test]
    fn test_record_limit() {
        let extractor = compile(BUS).unwrap();
        let config = ExtractionConfig {
            max_records: 1,
            fan_out_passengers: false,
            ..Default::default()
        };
        let result = extractor.extract_with(TICKET, &config);
        assert_eq!(result.records.len(), 1);
    }

    const RAIL: &str = r#"{
        "name": "test-rail",
        "document_fields": [
            { "name": "valid", "pattern": "Valid on (?P<valid_on>\\d{2}\\.\\d{2}\\.\\d{4})" }
        ],
        "record": {
            "fields": [
                { "name": "leg", "pattern": "(?P<dep>\\d{2}:\\d{2}) (?P<from>\\w+) - (?P<to>\\w+)" },
                { "name": "day", "pattern": "on (?P<day>\\d{2}\\.\\d{2}\\.\\d{4})", "optional": true, "scope": "line",
                  "fallback_from": { "day": "valid_on" } }
            ]
        },
        "projection": {
            "kind": "train",
            "origin": { "name": "from" },
            "destination": { "name": "to" },
            "start_time": { "fields": ["day", "dep"], "format": "%d.%m.%Y %H:%M" }
        }
    }"#;

    #[test]
    fn test_fallback_from_document_field() {
        let text = "Valid on 15.03.2024\n10:05 Berlin - Hamburg\n14:30 Hamburg - Kiel on 16.03.2024\n";
        let result = compile(RAIL).unwrap().extract(text);

        assert_eq!(result.reservations.len(), 2);
        assert_eq!(
            result.reservations[0].start_time(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(10, 5, 0)
        );
        assert_eq!(
            result.reservations[1].start_time(),
            NaiveDate::from_ymd_opt(2024, 3, 16).unwrap().and_hms_opt(14, 30, 0)
        );
    }

    #[test]
    fn test_compile_rejects_unknown_fallback_source() {
        let json = RAIL.replace(r#"{ "day": "valid_on" }"#, r#"{ "day": "purchase_date" }"#);
        let err = compile(&json).unwrap_err();
        assert!(matches!(
            err,
            ItinexError::Profile(ProfileError::UnknownKey { ref slot, ref key, .. })
                if key == "purchase_date" && slot == "day.fallback_from.day"
        ));
    }

    #[test]
    fn test_incomplete_reservations_are_discarded() {
        let text = "Valid on 15.03.2024\n10:05 Berlin - Hamburg\n";
        let json = RAIL.replace(r#""destination": { "name": "to" },"#, "");
        let result = compile(&json).unwrap().extract(text);

        assert_eq!(result.records.len(), 1);
        assert!(result.reservations.is_empty());
        assert_eq!(result.discarded, 1);
        assert!(result.is_empty());
    }

    #[test]
    fn test_repeated_legs_are_merged() {
        let text = "Valid on 15.03.2024\n10:05 Berlin - Hamburg\nSummary\n10:05 Berlin - Hamburg\n";
        let result = compile(RAIL).unwrap().extract(text);

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.reservations.len(), 1);
        assert_eq!(result.discarded, 0);
    }

    #[test]
    fn test_malformed_only_result_is_not_empty() {
        let text = "Coachline\nBooking: QX7K2M\n32.13.2024 08:15 Praha\n11:40 Brno\n";
        let result = compile(BUS).unwrap().extract(text);

        assert!(result.reservations.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(!result.is_empty());
        assert!(!result.has_reservations());
    }
}
