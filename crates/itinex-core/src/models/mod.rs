//! Data models: reservations, vendor profiles and configuration.

pub mod config;
pub mod profile;
pub mod reservation;

pub use config::{ExtractionConfig, ItinexConfig, PdfConfig, ProfilesConfig};
pub use profile::{FieldDef, Projection, RecordDef, SectionDef, TimeSlot, VendorProfile, YearSource};
pub use reservation::{Reservation, ReservationInfo, ReservationKind};
