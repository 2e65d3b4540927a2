//! Streaming merge of overlapping intervals within one sorted file.
//!
//! Output is BED3, or BED6 with the strand in column 6 when merging per
//! strand, followed by an optional count column.
//!
//! Reference categories must be pre-merged before entrywise coverage; this
//! command produces such files.
//!
//! # Algorithm
//!
//! For sorted input:
//! 1. Read intervals one at a time
//! 2. Extend the current span while the next interval overlaps or touches it
//! 3. Otherwise output the current span and start a new one
//!
//! # Memory Complexity
//!
//! O(1) - only tracks current merge span, regardless of input size.

use crate::bed::{BedError, BedReader};
use crate::interval::{ContigKey, Strand};
use crate::overlap::{IntervalMerger, Merged};
use crate::streaming::{ActiveInterval, CursorStream, TsvWriter};
use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Streaming merge command configuration.
#[derive(Debug, Clone, Default)]
pub struct MergeCommand {
    /// Maximum distance between intervals to merge (default: 0)
    pub distance: u64,
    /// Require strand to match for merging. Input must then be sorted by
    /// chromosome, strand, then start (`sort -k1,1 -k6,6 -k2,2n`).
    pub strand_specific: bool,
    /// Report count of merged intervals
    pub count: bool,
}

impl MergeCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum merge distance.
    pub fn with_distance(mut self, d: u64) -> Self {
        self.distance = d;
        self
    }

    /// Set strand-specific merging.
    pub fn with_strand(mut self, strand: bool) -> Self {
        self.strand_specific = strand;
        self
    }

    /// Add a count column.
    pub fn with_count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    /// Merge `input` into `output`.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<MergeStats, BedError> {
        let label = input.as_ref().display().to_string();
        let reader = BedReader::from_path(input)?;
        let cursor = CursorStream::sorted(reader, label, self.strand_specific)?;
        let mut out = TsvWriter::create(output)?;
        self.run_streaming(cursor, &mut out)
    }

    /// Merge `input` into `<stem>.merged.bed` next to it.
    pub fn run_beside<P: AsRef<Path>>(&self, input: P) -> Result<(PathBuf, MergeStats), BedError> {
        let output = merged_path(input.as_ref());
        let stats = self.run(input, &output)?;
        Ok((output, stats))
    }

    /// Core streaming merge over a sorted cursor.
    pub fn run_streaming<R: Read, W: Write>(
        &self,
        mut cursor: CursorStream<R>,
        out: &mut TsvWriter<W>,
    ) -> Result<MergeStats, BedError> {
        let mut stats = MergeStats::default();
        let mut merger = IntervalMerger::new(self.distance);
        let mut current: Option<ContigKey> = None;

        while let Some(rec) = cursor.next_record()? {
            stats.intervals_read += 1;
            let key = rec.key(self.strand_specific);

            if current.as_ref() != Some(&key) {
                if let (Some(prev), Some(done)) = (current.as_ref(), merger.finish()) {
                    self.write_span(out, prev, done)?;
                    stats.intervals_written += 1;
                }
                current = Some(key);
            }

            if let Some(done) = merger.push(ActiveInterval::new(rec.start(), rec.end())) {
                if let Some(key) = current.as_ref() {
                    self.write_span(out, key, done)?;
                    stats.intervals_written += 1;
                }
            }
        }

        if let (Some(key), Some(done)) = (current.as_ref(), merger.finish()) {
            self.write_span(out, key, done)?;
            stats.intervals_written += 1;
        }

        out.flush()?;
        Ok(stats)
    }

    #[inline]
    fn write_span<W: Write>(
        &self,
        out: &mut TsvWriter<W>,
        key: &ContigKey,
        merged: Merged,
    ) -> Result<(), BedError> {
        out.write_bed3(&key.chrom, merged.span.start, merged.span.end)?;
        // BED6 so the strand lands in the column readers take it from
        if self.strand_specific {
            out.write_str("\t.\t0\t")?;
            out.write_str(&key.strand.unwrap_or(Strand::Unknown).to_string())?;
        }
        if self.count {
            out.write_tab()?;
            out.write_int(merged.count)?;
        }
        out.write_newline()
    }
}

/// `peaks.bed` -> `peaks.merged.bed`, `peaks.bed.gz` -> `peaks.merged.bed`.
pub fn merged_path(input: &Path) -> PathBuf {
    let mut stem = input.to_path_buf();
    if stem.extension().is_some_and(|ext| ext == "gz") {
        stem.set_extension("");
    }
    if stem.extension().is_some_and(|ext| ext == "bed") {
        stem.set_extension("");
    }
    let mut name = stem.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".merged.bed");
    stem.with_file_name(name)
}

/// Statistics from streaming merge operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeStats {
    /// Number of intervals read
    pub intervals_read: usize,
    /// Number of merged intervals written
    pub intervals_written: usize,
}

impl MergeStats {
    /// Compression ratio (how many input intervals per output interval)
    pub fn compression_ratio(&self) -> f64 {
        if self.intervals_written == 0 {
            0.0
        } else {
            self.intervals_read as f64 / self.intervals_written as f64
        }
    }
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Read: {}, Written: {}, Compression: {:.2}x",
            self.intervals_read,
            self.intervals_written,
            self.compression_ratio()
        )
    }
}
