//! Error types for the itinex-core library.

use thiserror::Error;

/// Main error type for the itinex library.
#[derive(Error, Debug)]
pub enum ItinexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// A field pattern could not be compiled.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// A vendor profile is inconsistent.
    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),

    /// A record field could not be projected.
    #[error("field error: {0}")]
    Field(#[from] FieldError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors raised while registering field patterns.
#[derive(Error, Debug)]
pub enum PatternError {
    /// The regular expression is syntactically invalid.
    #[error("invalid pattern `{name}`: {source}")]
    Invalid {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while compiling a vendor profile.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// A projection slot refers to a key no field produces.
    #[error("profile `{profile}`: `{slot}` refers to unknown field `{key}`")]
    UnknownKey {
        profile: String,
        slot: String,
        key: String,
    },

    /// The record definition has no fields.
    #[error("profile `{0}` declares no record fields")]
    EmptyRecord(String),

    /// The locale has no month table.
    #[error("profile `{profile}`: unsupported locale `{locale}`")]
    UnknownLocale { profile: String, locale: String },

    /// Two profiles with the same name were registered.
    #[error("duplicate profile `{0}`")]
    Duplicate(String),
}

/// Scan-level outcomes that end a sequential scan.
///
/// Neither variant is ever returned to callers of the extraction API:
/// `NoMatch` ends a scan normally and `NoProgress` aborts it with the
/// records collected so far.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// A required field did not match at the given offset.
    #[error("required field `{field}` not found after offset {offset}")]
    NoMatch { field: String, offset: usize },

    /// The cursor could not move past its current position.
    #[error("cursor stuck at offset {position} (match ended at {match_end})")]
    NoProgress { position: usize, match_end: usize },
}

/// Errors produced when projecting a record into a reservation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The raw value cannot be converted to its typed form.
    #[error("malformed field `{field}` ({value:?}): {reason}")]
    Malformed {
        field: String,
        value: String,
        reason: String,
    },
}

impl FieldError {
    pub fn malformed(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Malformed {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for the itinex library.
pub type Result<T> = std::result::Result<T, ItinexError>;
