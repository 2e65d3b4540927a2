//! Sort validation for streaming operations.
//!
//! Streaming algorithms require sorted input. The validator runs inline as
//! records are pulled from a cursor, so files are read only once.
//!
//! Sort validation checks that:
//! 1. All records for a key (chromosome, or chromosome + strand) are
//!    contiguous
//! 2. Within a key, start positions are non-decreasing
//! 3. Optionally, records within a key do not overlap (pre-merged)
//!
//! Any consistent chromosome order works (lexicographic or genome order);
//! only contiguity is required unless key order is switched on, in which
//! case keys must ascend in [`ContigKey`] order.

use crate::bed::BedError;
use crate::interval::ContigKey;
use rustc_hash::FxHashSet;

/// Inline sort validator for use within streaming loops.
#[derive(Debug, Default)]
pub struct SortValidator {
    file_id: String,
    require_disjoint: bool,
    ordered_keys: bool,
    prev_key: Option<ContigKey>,
    prev_start: u64,
    /// Furthest end seen on the current key.
    reach: u64,
    seen_keys: FxHashSet<ContigKey>,
    record_count: usize,
}

impl SortValidator {
    /// Create a validator that checks sort order only.
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            ..Self::default()
        }
    }

    /// Also reject records that overlap an earlier record of the same key.
    pub fn with_disjoint(mut self, require_disjoint: bool) -> Self {
        self.require_disjoint = require_disjoint;
        self
    }

    /// Also reject a key that sorts before the previous one.
    pub fn with_key_order(mut self, ordered_keys: bool) -> Self {
        self.ordered_keys = ordered_keys;
        self
    }

    /// Validate that the given record maintains sort order.
    #[inline]
    pub fn validate(&mut self, key: &ContigKey, start: u64, end: u64) -> Result<(), BedError> {
        self.record_count += 1;

        match self.prev_key {
            Some(ref pk) if pk == key => {
                if start < self.prev_start {
                    return Err(BedError::Unsorted {
                        file: self.file_id.clone(),
                        message: format!(
                            "position {} at record {} comes after {} on {}",
                            start, self.record_count, self.prev_start, key
                        ),
                    });
                }
                if self.require_disjoint && start < self.reach {
                    return Err(BedError::OverlappingIntervals {
                        file: self.file_id.clone(),
                        message: format!(
                            "record {} starting at {} overlaps an earlier record ending at {} on {}",
                            self.record_count, start, self.reach, key
                        ),
                    });
                }
                self.reach = self.reach.max(end);
            }
            _ => {
                // Switching keys - check we haven't seen this one before
                if self.seen_keys.contains(key) {
                    return Err(BedError::Unsorted {
                        file: self.file_id.clone(),
                        message: format!(
                            "{} at record {} was seen earlier (chromosomes must be contiguous)",
                            key, self.record_count
                        ),
                    });
                }
                if let Some(pk) = self.prev_key.take() {
                    if self.ordered_keys && *key < pk {
                        return Err(BedError::Unsorted {
                            file: self.file_id.clone(),
                            message: format!(
                                "{} at record {} sorts before {} (keys must be in byte order)",
                                key, self.record_count, pk
                            ),
                        });
                    }
                    self.seen_keys.insert(pk);
                }
                self.prev_key = Some(key.clone());
                self.reach = end;
            }
        }

        self.prev_start = start;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Strand;

    fn key(chrom: &str) -> ContigKey {
        ContigKey::new(chrom, None)
    }

    #[test]
    fn test_sorted_passes() {
        let mut v = SortValidator::new("a.bed");
        assert!(v.validate(&key("chr1"), 100, 200).is_ok());
        assert!(v.validate(&key("chr1"), 100, 150).is_ok());
        assert!(v.validate(&key("chr1"), 300, 400).is_ok());
        assert!(v.validate(&key("chr2"), 0, 10).is_ok());
    }

    #[test]
    fn test_genome_order_passes() {
        let mut v = SortValidator::new("a.bed");
        assert!(v.validate(&key("chr9"), 100, 200).is_ok());
        assert!(v.validate(&key("chr10"), 100, 200).is_ok());
    }

    #[test]
    fn test_key_order() {
        let mut v = SortValidator::new("peaks.bed").with_key_order(true);
        v.validate(&key("chr10"), 100, 200).unwrap();
        let err = v.validate(&key("chr9"), 100, 200).unwrap_err();
        assert!(matches!(err, BedError::Unsorted { .. }));
        assert!(err.to_string().contains("chr9"));

        // Plus sorts before minus
        let mut v = SortValidator::new("peaks.bed").with_key_order(true);
        v.validate(&ContigKey::new("chr1", Some(Strand::Plus)), 5, 10).unwrap();
        v.validate(&ContigKey::new("chr1", Some(Strand::Minus)), 0, 10).unwrap();
        assert!(v
            .validate(&ContigKey::new("chr1", Some(Strand::Plus)), 20, 30)
            .is_err());
    }

    #[test]
    fn test_decreasing_start_fails() {
        let mut v = SortValidator::new("a.bed");
        v.validate(&key("chr1"), 300, 400).unwrap();
        let err = v.validate(&key("chr1"), 100, 200).unwrap_err();
        assert!(matches!(err, BedError::Unsorted { .. }));
        assert!(err.to_string().contains("a.bed"));
    }

    #[test]
    fn test_interleaved_chromosomes_fail() {
        let mut v = SortValidator::new("a.bed");
        v.validate(&key("chr1"), 100, 200).unwrap();
        v.validate(&key("chr2"), 100, 200).unwrap();
        assert!(matches!(
            v.validate(&key("chr1"), 300, 400),
            Err(BedError::Unsorted { .. })
        ));
    }

    #[test]
    fn test_strand_blocks_are_separate_keys() {
        let mut v = SortValidator::new("a.bed");
        let plus = ContigKey::new("chr1", Some(Strand::Plus));
        let minus = ContigKey::new("chr1", Some(Strand::Minus));
        v.validate(&plus, 500, 600).unwrap();
        // Start resets when the strand block changes
        v.validate(&minus, 100, 200).unwrap();
        assert!(v.validate(&plus, 700, 800).is_err());
    }

    #[test]
    fn test_disjoint_check() {
        let mut v = SortValidator::new("exons.bed").with_disjoint(true);
        v.validate(&key("chr1"), 10, 20).unwrap();
        // Touching is fine
        v.validate(&key("chr1"), 20, 30).unwrap();
        let err = v.validate(&key("chr1"), 25, 40).unwrap_err();
        assert!(matches!(err, BedError::OverlappingIntervals { .. }));
    }

    #[test]
    fn test_disjoint_check_uses_furthest_end() {
        let mut v = SortValidator::new("exons.bed").with_disjoint(true);
        v.validate(&key("chr1"), 0, 1000).unwrap();
        assert!(v.validate(&key("chr1"), 500, 600).is_err());
    }

    #[test]
    fn test_overlap_allowed_without_disjoint() {
        let mut v = SortValidator::new("peaks.bed");
        v.validate(&key("chr1"), 0, 1000).unwrap();
        assert!(v.validate(&key("chr1"), 500, 600).is_ok());
    }
}
