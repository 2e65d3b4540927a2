//! Runtime configuration for coverage runs.
//!
//! A single [`CoverageConfig`] is built once at startup (from the CLI or by
//! library callers) and handed to the commands by reference.

use crate::bed::BedError;
use clap::ValueEnum;
use regex::Regex;

/// Pattern for chromosomes that are usually missing from reference tracks:
/// unplaced/alternate contigs (`chr1_gl000191_random`, `chrUn_...`) and the
/// mitochondrial chromosome.
pub const NON_REFERENCE_PATTERN: &str = r"^chr.*_.*$|^chrM$";

/// What to report for an entry (or partition) with no bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ZeroLengthPolicy {
    /// Abort the run with an error naming the entry.
    #[default]
    Error,
    /// Report fractions of 0.
    Zero,
    /// Report fractions as NaN.
    Nan,
}

impl ZeroLengthPolicy {
    /// `overlap_bp / length`, with the policy applied when `length == 0`.
    ///
    /// `Error` reports 0 here; callers reject zero-length entries before
    /// they reach any fraction.
    #[inline]
    pub fn fraction(self, overlap_bp: u64, length: u64) -> f64 {
        if length > 0 {
            return overlap_bp as f64 / length as f64;
        }
        match self {
            ZeroLengthPolicy::Nan => f64::NAN,
            ZeroLengthPolicy::Error | ZeroLengthPolicy::Zero => 0.0,
        }
    }
}

/// How a reference cursor treats the pre-merged requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReferencePolicy {
    /// Fail if the file is unsorted or has overlapping intervals.
    #[default]
    Validate,
    /// Merge overlapping intervals while streaming (file must be sorted).
    Merge,
    /// Trust the file without checking anything.
    Assume,
}

/// Chromosomes excluded from a run.
#[derive(Debug, Clone)]
pub struct ChromFilter {
    pattern: Regex,
}

impl ChromFilter {
    /// Build a filter from a regular expression matched against chromosome names.
    pub fn new(pattern: &str) -> Result<Self, BedError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// The filter for non-canonical contigs and chrM.
    pub fn non_reference() -> Result<Self, BedError> {
        Self::new(NON_REFERENCE_PATTERN)
    }

    /// Should entries on this chromosome be skipped?
    #[inline]
    pub fn skips(&self, chrom: &str) -> bool {
        self.pattern.is_match(chrom)
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Configuration shared by the coverage commands.
#[derive(Debug, Clone, Default)]
pub struct CoverageConfig {
    /// Partition streams by (chromosome, strand) instead of chromosome.
    pub stranded: bool,
    pub zero_length: ZeroLengthPolicy,
    pub chrom_filter: Option<ChromFilter>,
    pub reference_policy: ReferencePolicy,
    /// Skip sort validation of the query stream.
    pub assume_sorted: bool,
}

impl CoverageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stranded(mut self, stranded: bool) -> Self {
        self.stranded = stranded;
        self
    }

    pub fn with_zero_length(mut self, policy: ZeroLengthPolicy) -> Self {
        self.zero_length = policy;
        self
    }

    pub fn with_chrom_filter(mut self, filter: Option<ChromFilter>) -> Self {
        self.chrom_filter = filter;
        self
    }

    pub fn with_reference_policy(mut self, policy: ReferencePolicy) -> Self {
        self.reference_policy = policy;
        self
    }

    pub fn with_assume_sorted(mut self, assume_sorted: bool) -> Self {
        self.assume_sorted = assume_sorted;
        self
    }

    /// Is this chromosome excluded by the configured filter?
    #[inline]
    pub fn skips_chrom(&self, chrom: &str) -> bool {
        self.chrom_filter.as_ref().is_some_and(|f| f.skips(chrom))
    }
}
