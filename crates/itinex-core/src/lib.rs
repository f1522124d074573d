//! Core library for travel itinerary extraction.
//!
//! This crate provides:
//! - A sequential scanner that cuts repeated records out of document text
//! - Declarative vendor profiles describing those records
//! - Projection of records into schema.org-style reservations
//! - Locale-aware date parsing and price detection
//! - PDF text extraction (feature `pdf`)

pub mod error;
pub mod extract;
pub mod models;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod price;
pub mod project;
pub mod scan;

pub use error::{ItinexError, Result};
pub use extract::{ExtractionResult, Extractor, RecordError, Registry};
pub use models::config::ItinexConfig;
pub use models::profile::VendorProfile;
pub use models::reservation::{Reservation, ReservationKind};
#[cfg(feature = "pdf")]
pub use pdf::{PdfContent, PdfExtractor, PdfProcessor, PdfType};
pub use price::{PriceFinder, PriceMatch};
pub use project::{FieldProjector, Locale};
pub use scan::{Cursor, FieldPattern, Record, RecordAssembler, ScanState, Scanner, Value};
