//! Core interval types for genomic region representation.

use std::fmt;

/// A genomic interval with chromosome, start, and end positions.
/// Uses 0-based, half-open coordinates (BED format).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    /// Create a new interval.
    #[inline]
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Returns the length of the interval.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the interval has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Number of bases `[a_start, a_end)` and `[b_start, b_end)` share.
///
/// Abutting intervals share nothing.
#[inline]
pub fn clipped_length(a_start: u64, a_end: u64, b_start: u64, b_end: u64) -> u64 {
    a_end.min(b_end).saturating_sub(a_start.max(b_start))
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start, self.end)
    }
}

/// One parsed line of a sorted interval file.
///
/// Only the coordinates and the strand (column 6) are interpreted; the
/// remaining columns are carried along untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalRecord {
    pub interval: Interval,
    pub strand: Option<Strand>,
    /// Columns after `end`, in file order (name, score, strand, ...).
    pub fields: Vec<String>,
}

impl IntervalRecord {
    /// Create a minimal BED3 record.
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            interval: Interval::new(chrom, start, end),
            strand: None,
            fields: Vec::new(),
        }
    }

    /// Set the strand.
    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = Some(strand);
        self
    }

    /// Get the chromosome.
    #[inline]
    pub fn chrom(&self) -> &str {
        &self.interval.chrom
    }

    /// Get the start position.
    #[inline]
    pub fn start(&self) -> u64 {
        self.interval.start
    }

    /// Get the end position.
    #[inline]
    pub fn end(&self) -> u64 {
        self.interval.end
    }

    /// Get the interval length.
    #[inline]
    pub fn len(&self) -> u64 {
        self.interval.len()
    }

    /// Check if the interval is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.interval.is_empty()
    }

    /// The contiguity key of this record.
    pub fn key(&self, stranded: bool) -> ContigKey {
        ContigKey {
            chrom: self.interval.chrom.clone(),
            strand: if stranded { self.strand } else { None },
        }
    }
}

impl fmt::Display for IntervalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.interval)?;
        for field in &self.fields {
            write!(f, "\t{}", field)?;
        }
        Ok(())
    }
}

/// The block a sorted stream is grouped by: a chromosome, or a
/// chromosome and strand when running stranded.
///
/// Keys order by chromosome bytes, then strand (`+`, `-`, `.`), which is
/// what `LC_ALL=C sort -k1,1 -k6,6` produces.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContigKey {
    pub chrom: String,
    pub strand: Option<Strand>,
}

impl ContigKey {
    pub fn new(chrom: impl Into<String>, strand: Option<Strand>) -> Self {
        Self {
            chrom: chrom.into(),
            strand,
        }
    }

    /// Does the record belong to this key?
    ///
    /// An unstranded key matches records of either strand.
    #[inline]
    pub fn matches(&self, record: &IntervalRecord) -> bool {
        self.chrom == record.chrom() && (self.strand.is_none() || self.strand == record.strand)
    }
}

impl fmt::Display for ContigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strand {
            Some(strand) => write!(f, "{}({})", self.chrom, strand),
            None => write!(f, "{}", self.chrom),
        }
    }
}

/// Strand orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => Strand::Plus,
            '-' => Strand::Minus,
            _ => Strand::Unknown,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipped_length_abutting() {
        assert_eq!(clipped_length(100, 200, 200, 300), 0);
        assert_eq!(clipped_length(100, 200, 0, 100), 0);
        assert_eq!(clipped_length(100, 200, 150, 160), 10);
        assert_eq!(clipped_length(100, 200, 300, 400), 0);
    }

    #[test]
    fn test_key_matching() {
        let plus = IntervalRecord::new("chr1", 10, 20).with_strand(Strand::Plus);
        let minus = IntervalRecord::new("chr1", 10, 20).with_strand(Strand::Minus);

        let unstranded = plus.key(false);
        assert!(unstranded.matches(&plus));
        assert!(unstranded.matches(&minus));

        let stranded = plus.key(true);
        assert!(stranded.matches(&plus));
        assert!(!stranded.matches(&minus));
        assert_eq!(stranded.to_string(), "chr1(+)");
    }

    #[test]
    fn test_key_order() {
        let plus = ContigKey::new("chr1", Some(Strand::Plus));
        let minus = ContigKey::new("chr1", Some(Strand::Minus));
        assert!(plus < minus);
        assert!(minus < ContigKey::new("chr1", Some(Strand::Unknown)));
        assert!(minus < ContigKey::new("chr10", Some(Strand::Plus)));
        assert!(ContigKey::new("chr10", None) < ContigKey::new("chr9", None));
        assert!(ContigKey::new("chr1_gl000191_random", None) < ContigKey::new("chr2", None));
    }

    #[test]
    fn test_record_display_keeps_fields() {
        let mut rec = IntervalRecord::new("chr1", 5, 15);
        rec.fields = vec!["peak1".to_string(), "0".to_string(), "+".to_string()];
        assert_eq!(rec.to_string(), "chr1\t5\t15\tpeak1\t0\t+");
    }
}
