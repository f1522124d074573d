//! Cursor-driven multi-record scanning.
//!
//! A [`Scanner`] walks a document with a [`Cursor`], asking a
//! [`RecordAssembler`] for one [`Record`] at a time and moving past it.
//! Assembly is driven by ordered [`FieldSpec`]s, each wrapping a
//! [`Matcher`] (usually a regex [`FieldPattern`]).

mod assembler;
mod cursor;
mod expand;
mod pattern;
mod record;
mod scanner;

pub use assembler::{Fallback, FieldSpec, Presence, RecordAssembler, Scope};
pub use cursor::Cursor;
pub use expand::{expand, expand_with};
pub use pattern::{FieldPattern, Matcher, PatternMatch, Span};
pub use record::{Record, Value};
pub use scanner::{ScanOutcome, ScanState, Scanner};
