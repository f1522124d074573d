//! Record assembly from an ordered list of field matchers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::cursor::Cursor;
use super::pattern::{Matcher, PatternMatch, Span};
use super::record::{Record, Value};
use crate::error::ScanError;

/// Whether a field must be present for the record to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// How far ahead a field may look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Anywhere in the remaining text.
    #[default]
    Rest,
    /// Only up to the end of the current line.
    Line,
}

impl Scope {
    fn window<'t>(&self, text: &'t str) -> &'t str {
        match self {
            Scope::Rest => text,
            Scope::Line => text.find('\n').map_or(text, |i| &text[..i]),
        }
    }
}

/// Value used for a key when an optional field does not match.
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback {
    /// A literal default.
    Value(Value),
    /// Copy of another key of the same record.
    Field(String),
    /// The same key from the previously assembled record.
    Previous,
}

/// One field of a record.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    matcher: Arc<dyn Matcher>,
    presence: Presence,
    scope: Scope,
    named: bool,
    fallbacks: Vec<(String, Fallback)>,
}

impl FieldSpec {
    pub fn required(matcher: impl Matcher + 'static) -> Self {
        Self::new(Arc::new(matcher), Presence::Required)
    }

    pub fn optional(matcher: impl Matcher + 'static) -> Self {
        Self::new(Arc::new(matcher), Presence::Optional)
    }

    pub fn new(matcher: Arc<dyn Matcher>, presence: Presence) -> Self {
        let named = matcher.output_keys() != [matcher.name()];
        Self {
            matcher,
            presence,
            scope: Scope::Rest,
            named,
            fallbacks: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Use a literal value for `key` when the field is missing.
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fallbacks.push((key.into(), Fallback::Value(value.into())));
        self
    }

    /// Copy `source` into `key` when the field is missing.
    pub fn with_fallback_field(mut self, key: impl Into<String>, source: impl Into<String>) -> Self {
        self.fallbacks.push((key.into(), Fallback::Field(source.into())));
        self
    }

    /// Carry `key` over from the previous record when the field is missing.
    pub fn with_carry(mut self, key: impl Into<String>) -> Self {
        self.fallbacks.push((key.into(), Fallback::Previous));
        self
    }

    pub fn name(&self) -> &str {
        self.matcher.name()
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn fallbacks(&self) -> &[(String, Fallback)] {
        &self.fallbacks
    }

    /// Keys this field can put into a record, fallbacks included.
    pub fn output_keys(&self) -> Vec<String> {
        let mut keys = self.matcher.output_keys();
        for (key, _) in &self.fallbacks {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Match this field anywhere in `text`, independent of any cursor.
    ///
    /// On a match the captures are stored in `record`; otherwise the
    /// field's fallbacks are applied. Returns whether the field matched.
    pub fn fill(&self, text: &str, record: &mut Record) -> bool {
        match self.matcher.find(self.scope.window(text)) {
            Some(m) => {
                self.capture_into(&m, record);
                true
            }
            None => {
                self.apply_fallbacks(record, None);
                false
            }
        }
    }

    fn capture_into(&self, m: &PatternMatch<'_>, record: &mut Record) {
        if self.named {
            for (key, value) in m.named() {
                record.insert(key, value);
            }
        } else {
            record.insert(self.name(), m.primary());
        }
    }

    fn resolve_field_fallbacks(&self, record: &mut Record) {
        for (key, fallback) in &self.fallbacks {
            if let Fallback::Field(source) = fallback {
                if !record.contains(key) {
                    if let Some(value) = record.get(source).cloned() {
                        record.insert(key.as_str(), value);
                    }
                }
            }
        }
    }

    fn apply_fallbacks(&self, record: &mut Record, previous: Option<&Record>) {
        for (key, fallback) in &self.fallbacks {
            if record.contains(key) {
                continue;
            }
            let value = match fallback {
                Fallback::Value(v) => Some(v.clone()),
                Fallback::Field(source) => record.get(source).cloned(),
                Fallback::Previous => previous.and_then(|p| p.get(key)).cloned(),
            };
            if let Some(value) = value {
                record.insert(key.as_str(), value);
            }
        }
    }
}

/// Builds one [`Record`] from the text after a cursor.
#[derive(Debug, Clone, Default)]
pub struct RecordAssembler {
    fields: Vec<FieldSpec>,
    terminator: Option<Arc<dyn Matcher>>,
}

impl RecordAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Fields are matched in declaration order.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Stop assembling when `matcher` occurs at or before the record's first field.
    pub fn with_terminator(mut self, matcher: impl Matcher + 'static) -> Self {
        self.terminator = Some(Arc::new(matcher));
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Union of the keys all fields can produce.
    pub fn output_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for field in &self.fields {
            for key in field.output_keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Fill keys still missing from `record` through `fallback_from`, for
    /// sources merged in after assembly (document and section fields).
    pub fn resolve_field_fallbacks(&self, record: &mut Record) {
        for field in &self.fields {
            field.resolve_field_fallbacks(record);
        }
    }

    /// Assemble one record starting at `cursor`.
    ///
    /// Fields are searched left to right; each match moves a local cursor so
    /// the next field only sees the text after it. The caller's cursor is not
    /// touched. The returned record's span covers the first matched field up
    /// to the end of the last one, in document offsets.
    pub fn assemble(&self, cursor: &Cursor<'_>, previous: Option<&Record>) -> Result<Record, ScanError> {
        let mut local = *cursor;
        let mut record = Record::default();
        let mut start: Option<usize> = None;
        let mut missing: Vec<&FieldSpec> = Vec::new();

        for field in &self.fields {
            let window = field.scope.window(local.remaining());
            match field.matcher.find(window) {
                Some(m) => {
                    let m = m.shifted(local.position());
                    if start.is_none() {
                        self.check_terminator(&local, m.start())?;
                        start = Some(m.start());
                    }
                    trace!(field = field.name(), start = m.start(), end = m.end(), "field matched");
                    field.capture_into(&m, &mut record);
                    local.seek(m.end());
                }
                None if field.presence == Presence::Required => {
                    return Err(ScanError::NoMatch {
                        field: field.name().to_string(),
                        offset: local.position(),
                    });
                }
                None => missing.push(field),
            }
        }

        let Some(start) = start else {
            return Err(ScanError::NoMatch {
                field: self.fields.first().map(|f| f.name().to_string()).unwrap_or_default(),
                offset: cursor.position(),
            });
        };

        for field in missing {
            field.apply_fallbacks(&mut record, previous);
        }

        record.set_span(Span::new(start, local.position()));
        Ok(record)
    }

    fn check_terminator(&self, local: &Cursor<'_>, first_start: usize) -> Result<(), ScanError> {
        let Some(terminator) = &self.terminator else {
            return Ok(());
        };
        if let Some(m) = terminator.find(local.remaining()) {
            let at = local.position() + m.start();
            if at <= first_start {
                return Err(ScanError::NoMatch {
                    field: terminator.name().to_string(),
                    offset: at,
                });
            }
        }
        Ok(())
    }
}
