//! Monotonic scan cursor.

use crate::error::ScanError;

/// Byte offset into a document that only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'t> {
    text: &'t str,
    position: usize,
}

impl<'t> Cursor<'t> {
    /// Create a cursor at the start of `text`.
    pub fn new(text: &'t str) -> Self {
        Self { text, position: 0 }
    }

    /// Create a cursor at `position`, clamped to the text length.
    ///
    /// `position` must lie on a char boundary; offsets produced by a
    /// [`PatternMatch`](super::PatternMatch) always do.
    pub fn at(text: &'t str, position: usize) -> Self {
        Self {
            text,
            position: position.min(text.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// The whole document.
    pub fn text(&self) -> &'t str {
        self.text
    }

    /// Text from the cursor to the end of the document.
    pub fn remaining(&self) -> &'t str {
        &self.text[self.position..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.text.len()
    }

    /// Move the cursor to `match_end`.
    ///
    /// Fails with [`ScanError::NoProgress`] if `match_end` is not strictly
    /// past the current position; the cursor is left untouched in that case.
    pub fn advance(&mut self, match_end: usize) -> Result<(), ScanError> {
        if match_end <= self.position {
            return Err(ScanError::NoProgress {
                position: self.position,
                match_end,
            });
        }
        self.position = match_end.min(self.text.len());
        Ok(())
    }

    /// Move the cursor to `offset` if it lies ahead, otherwise stay put.
    pub fn seek(&mut self, offset: usize) {
        self.position = self.position.max(offset.min(self.text.len()));
    }
}
