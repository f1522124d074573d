//! Declarative vendor profiles.
//!
//! A profile describes how to find reservations in one vendor's documents:
//! which field patterns make up a record, how records are grouped into
//! sections, and which record keys fill which reservation slots.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::reservation::ReservationKind;
use crate::error::Result;
use crate::scan::Scope;

/// A vendor profile as written in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorProfile {
    /// Unique profile name, e.g. `db-ticket`.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Language of month names in the documents, e.g. `de`. Falls back
    /// to the configured default locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Pattern that must occur somewhere in the document for the profile to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,

    /// Fields matched once against the whole document and shared by all records.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_fields: Vec<FieldDef>,

    /// Optional grouping of records into sections (outward / return journey).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionDef>,

    /// The repeating record.
    pub record: RecordDef,

    /// Pattern listing the travellers; each match yields one passenger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passengers: Option<String>,

    /// Mapping of record keys onto the reservation schema.
    pub projection: Projection,
}

impl VendorProfile {
    /// Parse a profile from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a profile from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One field pattern of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    /// Regular expression. Named groups become record keys; without named
    /// groups, group 1 (or the whole match) is stored under `name`.
    pub pattern: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,

    #[serde(default, skip_serializing_if = "is_rest")]
    pub scope: Scope,

    /// Literal values used when the field does not match.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, String>,

    /// `key -> source key` copies used when the field does not match.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fallback_from: BTreeMap<String, String>,

    /// Keys carried over from the previous record when the field does not match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub carry: Vec<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            optional: false,
            scope: Scope::Rest,
            defaults: BTreeMap::new(),
            fallback_from: BTreeMap::new(),
            carry: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_rest(scope: &Scope) -> bool {
    *scope == Scope::Rest
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDef {
    /// Section header. Its named groups are merged into the section's records.
    pub start: String,

    /// Where the last section ends, e.g. a footer. Defaults to end of text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDef {
    pub fields: Vec<FieldDef>,

    /// Pattern that ends the record list when it precedes the next record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminator: Option<String>,
}

/// Record keys for each reservation slot. Every slot is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub kind: ReservationKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<PlaceSlot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<PlaceSlot>,

    /// Hotel or event venue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<VenueSlot>,

    /// Flight, train or bus number; event or vessel name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat: Option<SeatSlot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<TimeSlot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<TimeSlot>,
}

impl Projection {
    pub fn new(kind: ReservationKind) -> Self {
        Self {
            kind,
            reservation_number: None,
            passenger: None,
            origin: None,
            destination: None,
            venue: None,
            vehicle_number: None,
            carrier_code: None,
            carrier_name: None,
            seat: None,
            ticket_token: None,
            start_time: None,
            end_time: None,
        }
    }

    /// Every `(slot, record key)` pair the projection reads.
    pub fn references(&self) -> Vec<(String, String)> {
        let mut refs: Vec<(String, String)> = Vec::new();
        let mut push = |slot: &str, key: &Option<String>| {
            if let Some(key) = key {
                refs.push((slot.to_string(), key.clone()));
            }
        };

        push("reservation_number", &self.reservation_number);
        push("passenger", &self.passenger);
        push("vehicle_number", &self.vehicle_number);
        push("carrier_code", &self.carrier_code);
        push("carrier_name", &self.carrier_name);
        push("ticket_token", &self.ticket_token);

        for (slot, place) in [("origin", &self.origin), ("destination", &self.destination)] {
            if let Some(place) = place {
                push(&format!("{slot}.name"), &place.name);
                push(&format!("{slot}.code"), &place.code);
                push(&format!("{slot}.platform"), &place.platform);
                push(&format!("{slot}.identifier"), &place.identifier);
            }
        }

        if let Some(venue) = &self.venue {
            push("venue.name", &venue.name);
            push("venue.street", &venue.street);
            push("venue.locality", &venue.locality);
            push("venue.postal_code", &venue.postal_code);
            push("venue.country", &venue.country);
            push("venue.telephone", &venue.telephone);
        }

        if let Some(seat) = &self.seat {
            push("seat.number", &seat.number);
            push("seat.section", &seat.section);
            push("seat.seating_type", &seat.seating_type);
        }

        for (slot, time) in [("start_time", &self.start_time), ("end_time", &self.end_time)] {
            if let Some(time) = time {
                for field in &time.fields {
                    refs.push((slot.to_string(), field.clone()));
                }
                match &time.year {
                    Some(YearSource::Field { field }) | Some(YearSource::Following { field, .. }) => {
                        refs.push((format!("{slot}.year"), field.clone()));
                    }
                    _ => {}
                }
            }
        }

        refs
    }
}

/// Departure or arrival place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// IATA airport code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Platform, or terminal for flights.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Station identifier such as a UIC code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeatSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Coach or cabin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Class of service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seating_type: Option<String>,
}

/// A timestamp assembled from one or more record keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Keys whose values are joined with a single space.
    pub fields: Vec<String>,

    /// chrono format of the joined value. `%b`/`%B` accept localized month names.
    pub format: String,

    /// Where the year comes from when the date omits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<YearSource>,
}

impl TimeSlot {
    pub fn new(fields: &[&str], format: impl Into<String>) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            format: format.into(),
            year: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum YearSource {
    /// A record key holding the year (two-digit years are expanded).
    Field { field: String },
    /// A fixed year.
    Fixed { year: i32 },
    /// First occurrence of the day and month on or after the date in `field`.
    Following { field: String, format: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PROFILE: &str = r#"{
        "name": "sample-rail",
        "locale": "de",
        "document_fields": [
            { "name": "booking", "pattern": "Auftrag (?P<booking>[A-Z0-9]{6})" }
        ],
        "record": {
            "fields": [
                { "name": "dep", "pattern": "ab (?P<from>.+?) (?P<dep>\\d{2}:\\d{2})" },
                { "name": "platform", "pattern": "Gl\\. (\\d+)", "optional": true, "scope": "line",
                  "defaults": { "platform": "?" } }
            ]
        },
        "projection": {
            "kind": "train",
            "reservation_number": "booking",
            "origin": { "name": "from", "platform": "platform" },
            "start_time": { "fields": ["date", "dep"], "format": "%d.%m. %H:%M",
                            "year": { "from": "following", "field": "bought", "format": "%d.%m.%Y" } }
        }
    }"#;

    #[test]
    fn test_parse_profile() {
        let profile = VendorProfile::from_json(PROFILE).unwrap();
        assert_eq!(profile.name, "sample-rail");
        assert_eq!(profile.locale.as_deref(), Some("de"));
        assert_eq!(profile.record.fields.len(), 2);
        assert!(profile.record.fields[1].optional);
        assert_eq!(profile.record.fields[1].scope, Scope::Line);
        assert_eq!(profile.projection.kind, ReservationKind::Train);
        assert_eq!(
            profile.projection.start_time.as_ref().unwrap().year,
            Some(YearSource::Following {
                field: "bought".to_string(),
                format: "%d.%m.%Y".to_string()
            })
        );
    }

    #[test]
    fn test_minimal_profile() {
        let profile = VendorProfile::from_json(
            r#"{ "name": "x", "record": { "fields": [] }, "projection": { "kind": "event" } }"#,
        )
        .unwrap();
        assert_eq!(profile.locale, None);
        assert!(profile.section.is_none());
        assert!(profile.document_fields.is_empty());
    }

    #[test]
    fn test_references() {
        let profile = VendorProfile::from_json(PROFILE).unwrap();
        let refs = profile.projection.references();

        assert!(refs.contains(&("reservation_number".to_string(), "booking".to_string())));
        assert!(refs.contains(&("origin.platform".to_string(), "platform".to_string())));
        assert!(refs.contains(&("start_time".to_string(), "date".to_string())));
        assert!(refs.contains(&("start_time.year".to_string(), "bought".to_string())));
    }

    #[test]
    fn test_json_round_trip_is_stable() {
        let profile = VendorProfile::from_json(PROFILE).unwrap();
        let again = VendorProfile::from_json(&profile.to_json().unwrap()).unwrap();
        assert_eq!(again, profile);
    }
}
