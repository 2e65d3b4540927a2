//! Streaming BED file parser.

use crate::interval::{IntervalRecord, Strand};
use crate::streaming::buffers::{DEFAULT_INPUT_BUFFER, DEFAULT_LINE_BUFFER};
use crate::streaming::parsing::{parse_u64_fast, should_skip_line};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading intervals or computing coverage.
#[derive(Error, Debug)]
pub enum BedError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("File {file} not sorted: {message}")]
    Unsorted { file: String, message: String },

    #[error("File {file} has overlapping intervals: {message} (merge it first or use --reference-policy merge)")]
    OverlappingIntervals { file: String, message: String },

    #[error("Zero-length entry {chrom}:{start} has no bases to compute a fraction over")]
    ZeroLengthEntry { chrom: String, start: u64 },

    #[error("Invalid chromosome pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, BedError>;

/// Minimum number of columns in an interval line.
pub const MIN_COLUMNS: usize = 3;

/// Column holding the strand in BED6 and wider files.
const STRAND_COLUMN: usize = 5;

/// Open a file for reading, decompressing it when the name ends in `.gz`.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn Read>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        BedError::Io(io::Error::new(
            e.kind(),
            format!("cannot open {}: {}", path.display(), e),
        ))
    })?;
    let is_gzipped = path.extension().is_some_and(|ext| ext == "gz");
    if is_gzipped {
        Ok(Box::new(MultiGzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// A streaming BED file reader.
pub struct BedReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
}

impl BedReader<Box<dyn Read>> {
    /// Open a BED file from a path, plain or gzip-compressed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_capacity(open_input(path)?, DEFAULT_INPUT_BUFFER))
    }
}

impl<R: Read> BedReader<R> {
    /// Create a new BED reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(DEFAULT_LINE_BUFFER),
        }
    }

    /// Create a BED reader with custom buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            buffer: String::with_capacity(DEFAULT_LINE_BUFFER),
        }
    }

    /// Line number of the most recently read line (1-based).
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next data line, skipping blanks, comments and track lines.
    ///
    /// The returned slice has its line terminator removed.
    pub fn next_line(&mut self) -> Result<Option<&str>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim_end_matches(['\n', '\r']);
            if should_skip_line(line.as_bytes()) || line.trim().is_empty() {
                continue;
            }
            let len = line.len();
            return Ok(Some(&self.buffer[..len]));
        }
    }

    /// Read the next BED record.
    pub fn read_record(&mut self) -> Result<Option<IntervalRecord>> {
        if self.next_line()?.is_none() {
            return Ok(None);
        }
        let line = self.buffer.trim_end_matches(['\n', '\r']);
        parse_record(line, self.line_number).map(Some)
    }

    /// Get an iterator over all records.
    pub fn records(self) -> BedRecordIter<R> {
        BedRecordIter { reader: self }
    }
}

/// Parse a single tab-separated interval line.
pub fn parse_record(line: &str, line_number: usize) -> Result<IntervalRecord> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() < MIN_COLUMNS {
        return Err(BedError::Parse {
            line: line_number,
            message: format!(
                "Expected at least {} fields, got {}",
                MIN_COLUMNS,
                fields.len()
            ),
        });
    }

    let start = parse_position(fields[1], "start", line_number)?;
    let end = parse_position(fields[2], "end", line_number)?;

    if start > end {
        return Err(BedError::Parse {
            line: line_number,
            message: format!("Start ({}) > end ({})", start, end),
        });
    }

    let mut record = IntervalRecord::new(fields[0], start, end);
    if let Some(strand) = fields.get(STRAND_COLUMN) {
        record.strand = strand.chars().next().map(Strand::from_char);
    }
    record.fields = fields[MIN_COLUMNS..].iter().map(|s| s.to_string()).collect();

    Ok(record)
}

fn parse_position(s: &str, field_name: &str, line_number: usize) -> Result<u64> {
    parse_u64_fast(s.trim().as_bytes()).ok_or_else(|| BedError::Parse {
        line: line_number,
        message: format!("Invalid {} position: '{}'", field_name, s),
    })
}

/// Iterator over BED records.
pub struct BedRecordIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> Iterator for BedRecordIter<R> {
    type Item = Result<IntervalRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Parse records from a string (useful for testing).
pub fn parse_records(content: &str) -> Result<Vec<IntervalRecord>> {
    BedReader::new(content.as_bytes()).records().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_parse_bed3() {
        let content = "chr1\t100\t200\nchr1\t300\t400\n";
        let records = parse_records(content).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chrom(), "chr1");
        assert_eq!(records[0].start(), 100);
        assert_eq!(records[0].end(), 200);
        assert_eq!(records[0].strand, None);
        assert!(records[0].fields.is_empty());
    }

    #[test]
    fn test_parse_bed6() {
        let content = "chr1\t100\t200\tpeak1\t500\t-\n";
        let records = parse_records(content).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].strand, Some(Strand::Minus));
        assert_eq!(records[0].fields, vec!["peak1", "500", "-"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let records = parse_records("chr1\t1\t5\r\nchr1\t6\t9\r\n").unwrap();
        assert_eq!(records[1].end(), 9);
    }

    #[test]
    fn test_skip_comments_and_track_lines() {
        let content = "# comment\ntrack name=test\nbrowser position chr1:1-1000\n\nchr1\t100\t200\n";
        let records = parse_records(content).unwrap();

        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_too_few_columns_is_fatal() {
        let err = parse_records("chr1\t100\t200\nchr1\t100\n").unwrap_err();
        match err {
            BedError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_coordinate_is_fatal() {
        assert!(matches!(
            parse_records("chr1\tabc\t200\n"),
            Err(BedError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_inverted_interval_is_fatal() {
        assert!(parse_records("chr1\t300\t200\n").is_err());
    }

    #[test]
    fn test_gzip_input_by_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peaks.bed.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"chr1\t10\t20\nchr2\t5\t8\n").unwrap();
        encoder.finish().unwrap();

        let records: Vec<_> = BedReader::from_path(&path)
            .unwrap()
            .records()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].chrom(), "chr2");
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = BedReader::from_path("/nonexistent/annocov/peaks.bed")
            .err()
            .unwrap();
        assert!(err.to_string().contains("/nonexistent/annocov/peaks.bed"));
    }
}
