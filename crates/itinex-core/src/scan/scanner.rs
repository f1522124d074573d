//! The sequential scan loop.

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::assembler::RecordAssembler;
use super::cursor::Cursor;
use super::record::Record;
use crate::error::ScanError;

/// Scanner state. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Scanning,
    /// No further record could be assembled.
    Done,
    /// The cursor failed to advance; the scan was aborted.
    Failed,
}

/// Records collected by one scan plus how the scan ended.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub records: Vec<Record>,
    pub state: ScanState,
    /// The error that ended the scan: `NoMatch` for `Done`, `NoProgress` for `Failed`.
    pub stop: Option<ScanError>,
    /// Cursor position when the scan ended.
    pub position: usize,
}

impl ScanOutcome {
    pub fn is_failed(&self) -> bool {
        self.state == ScanState::Failed
    }
}

/// Repeatedly assembles records and advances the cursor past them.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    assembler: &'a RecordAssembler,
    limit: Option<usize>,
}

impl<'a> Scanner<'a> {
    pub fn new(assembler: &'a RecordAssembler) -> Self {
        Self {
            assembler,
            limit: None,
        }
    }

    /// Stop after `limit` records. `0` means unlimited.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn scan(&self, text: &str) -> ScanOutcome {
        self.scan_from(text, 0)
    }

    /// Scan `text` starting at byte offset `start`.
    ///
    /// Terminates on the first assembly failure (`Done`) or when a record
    /// does not move the cursor forward (`Failed`). In both cases the records
    /// accumulated so far are returned; a record that failed to advance the
    /// cursor is not among them.
    pub fn scan_from(&self, text: &str, start: usize) -> ScanOutcome {
        let mut cursor = Cursor::at(text, start);
        let mut records: Vec<Record> = Vec::new();
        let mut state = ScanState::Scanning;
        let mut stop = None;

        while state == ScanState::Scanning {
            if self.limit.is_some_and(|limit| records.len() >= limit) {
                debug!(limit = ?self.limit, "record limit reached");
                state = ScanState::Done;
                break;
            }

            match self.assembler.assemble(&cursor, records.last()) {
                Ok(record) => {
                    let before = cursor.position();
                    match cursor.advance(record.span().end) {
                        Ok(()) => {
                            trace!(
                                index = records.len(),
                                before,
                                after = cursor.position(),
                                "record assembled"
                            );
                            records.push(record);
                        }
                        Err(e) => {
                            warn!("Aborting scan after {} records: {}", records.len(), e);
                            state = ScanState::Failed;
                            stop = Some(e);
                        }
                    }
                }
                Err(e) => {
                    debug!("Scan finished with {} records: {}", records.len(), e);
                    state = ScanState::Done;
                    stop = Some(e);
                }
            }
        }

        ScanOutcome {
            records,
            state,
            stop,
            position: cursor.position(),
        }
    }
}
