//! Forward-only cursor over a sorted interval file.
//!
//! A [`CursorStream`] exposes the current record, moves forward one record
//! at a time, and can skip ahead to a key. Sort checks and the
//! [`ReferencePolicy`] are applied as records are pulled, so the file is
//! read exactly once.

use crate::bed::{BedError, BedReader};
use crate::config::ReferencePolicy;
use crate::interval::{ContigKey, IntervalRecord};
use crate::streaming::validation::SortValidator;
use std::io::Read;
use std::path::Path;

/// Cursor over a sorted interval file.
pub struct CursorStream<R: Read> {
    reader: BedReader<R>,
    label: String,
    stranded: bool,
    merge: bool,
    validator: Option<SortValidator>,
    current: Option<IntervalRecord>,
    /// Record read ahead while merging, not yet exposed.
    lookahead: Option<IntervalRecord>,
    records_read: usize,
}

impl CursorStream<Box<dyn Read>> {
    /// Open a file (plain or `.gz`) as a cursor positioned on its first record.
    pub fn open<P: AsRef<Path>>(
        path: P,
        policy: ReferencePolicy,
        stranded: bool,
    ) -> Result<Self, BedError> {
        let label = path.as_ref().display().to_string();
        let reader = BedReader::from_path(path)?;
        Self::with_options(reader, label, policy, stranded)
    }

    /// Open a query file. Sort order is checked unless `assume_sorted`;
    /// overlapping records are always allowed.
    pub fn open_query<P: AsRef<Path>>(
        path: P,
        assume_sorted: bool,
        stranded: bool,
    ) -> Result<Self, BedError> {
        let label = path.as_ref().display().to_string();
        let reader = BedReader::from_path(path)?;
        if assume_sorted {
            Self::with_options(reader, label, ReferencePolicy::Assume, stranded)
        } else {
            Self::sorted(reader, label, stranded)
        }
    }
}

impl<R: Read> CursorStream<R> {
    /// Cursor with no validation, unstranded.
    pub fn new(reader: BedReader<R>, label: impl Into<String>) -> Result<Self, BedError> {
        Self::with_options(reader, label, ReferencePolicy::Assume, false)
    }

    /// Cursor with an explicit reference policy.
    ///
    /// - `Assume`: records are exposed as read.
    /// - `Validate`: sort order and disjointness are checked.
    /// - `Merge`: sort order is checked and overlapping or touching
    ///   records of a key are merged into one.
    pub fn with_options(
        reader: BedReader<R>,
        label: impl Into<String>,
        policy: ReferencePolicy,
        stranded: bool,
    ) -> Result<Self, BedError> {
        let label = label.into();
        let validator = match policy {
            ReferencePolicy::Assume => None,
            ReferencePolicy::Validate => {
                Some(SortValidator::new(label.clone()).with_disjoint(true))
            }
            ReferencePolicy::Merge => Some(SortValidator::new(label.clone())),
        };
        let mut cursor = Self {
            reader,
            label,
            stranded,
            merge: policy == ReferencePolicy::Merge,
            validator,
            current: None,
            lookahead: None,
            records_read: 0,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    /// Sort-check only, no disjointness requirement (query streams).
    pub fn sorted(
        reader: BedReader<R>,
        label: impl Into<String>,
        stranded: bool,
    ) -> Result<Self, BedError> {
        let mut cursor = Self::with_options(reader, label, ReferencePolicy::Assume, stranded)?;
        cursor.validator = Some(SortValidator::new(cursor.label.clone()));
        // The first record was pulled before the validator existed.
        if let Some(rec) = cursor.current.as_ref() {
            let key = rec.key(stranded);
            if let Some(v) = cursor.validator.as_mut() {
                v.validate(&key, rec.start(), rec.end())?;
            }
        }
        Ok(cursor)
    }

    /// The current record, or None at end of stream.
    #[inline]
    pub fn peek(&self) -> Option<&IntervalRecord> {
        self.current.as_ref()
    }

    /// Move to the next record.
    pub fn advance(&mut self) -> Result<(), BedError> {
        let mut next = match self.lookahead.take() {
            Some(rec) => Some(rec),
            None => self.pull()?,
        };

        if self.merge {
            if let Some(cur) = next.as_mut() {
                loop {
                    match self.pull()? {
                        Some(rec) if self.same_key(cur, &rec) && rec.start() <= cur.end() => {
                            cur.interval.end = cur.end().max(rec.end());
                        }
                        other => {
                            self.lookahead = other;
                            break;
                        }
                    }
                }
            }
        }

        self.current = next;
        Ok(())
    }

    /// Take the current record and move past it.
    pub fn next_record(&mut self) -> Result<Option<IntervalRecord>, BedError> {
        let rec = self.current.take();
        if rec.is_some() {
            self.advance()?;
        }
        Ok(rec)
    }

    /// Discard records until the current one is on `key` or the stream ends.
    ///
    /// Returns the number of records discarded.
    pub fn fast_forward(&mut self, key: &ContigKey) -> Result<usize, BedError> {
        let mut skipped = 0;
        while let Some(rec) = self.current.as_ref() {
            if key.matches(rec) {
                break;
            }
            skipped += 1;
            self.advance()?;
        }
        Ok(skipped)
    }

    /// Discard records whose key sorts before `key`.
    ///
    /// Unlike [`fast_forward`](Self::fast_forward) this stops at any key at
    /// or after `key`, so a key missing from this file leaves the cursor
    /// where it is. Both streams must be in ascending [`ContigKey`] order.
    pub fn skip_before(&mut self, key: &ContigKey) -> Result<usize, BedError> {
        let mut skipped = 0;
        while let Some(rec) = self.current.as_ref() {
            if rec.key(self.stranded) >= *key {
                break;
            }
            skipped += 1;
            self.advance()?;
        }
        Ok(skipped)
    }

    /// Also reject keys that are out of ascending [`ContigKey`] order.
    ///
    /// Has no effect on a cursor without sort validation.
    pub fn with_key_order(mut self) -> Self {
        self.validator = self.validator.take().map(|v| v.with_key_order(true));
        self
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }

    /// File name or other label used in error messages.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Records read from the underlying file so far.
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    fn same_key(&self, a: &IntervalRecord, b: &IntervalRecord) -> bool {
        a.chrom() == b.chrom() && (!self.stranded || a.strand == b.strand)
    }

    /// Read and validate one record from the file.
    fn pull(&mut self) -> Result<Option<IntervalRecord>, BedError> {
        let rec = match self.reader.read_record()? {
            Some(rec) => rec,
            None => return Ok(None),
        };
        self.records_read += 1;

        if self.stranded && rec.strand.is_none() {
            return Err(BedError::Parse {
                line: self.reader.line_number(),
                message: format!(
                    "{}: stranded mode needs a strand in column 6",
                    self.label
                ),
            });
        }

        if let Some(validator) = self.validator.as_mut() {
            validator.validate(&rec.key(self.stranded), rec.start(), rec.end())?;
        }

        Ok(Some(rec))
    }
}
