//! Running coverage totals for a chromosome or the whole genome.

use crate::config::ZeroLengthPolicy;

/// Partition label of the genome-wide summary row.
pub const GENOMEWIDE: &str = "genomewide";

/// Entry and overlap totals for one partition of the query stream.
///
/// Used both per chromosome and genome-wide; `overlap_bp` has one slot per
/// category, in category order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageTotals {
    pub partition: String,
    /// Entries added.
    pub entries: u64,
    /// Total length of the entries added.
    pub entry_bp: u64,
    pub overlap_bp: Vec<u64>,
}

impl CoverageTotals {
    pub fn new(partition: impl Into<String>, categories: usize) -> Self {
        Self {
            partition: partition.into(),
            entries: 0,
            entry_bp: 0,
            overlap_bp: vec![0; categories],
        }
    }

    /// Totals spanning the whole run.
    pub fn genomewide(categories: usize) -> Self {
        Self::new(GENOMEWIDE, categories)
    }

    /// Add one scored entry.
    #[inline]
    pub fn add_entry(&mut self, length: u64, overlaps: &[u64]) {
        debug_assert_eq!(overlaps.len(), self.overlap_bp.len());
        self.entries += 1;
        self.entry_bp += length;
        for (total, bp) in self.overlap_bp.iter_mut().zip(overlaps) {
            *total += bp;
        }
    }

    /// Fold another partition's totals into this one.
    pub fn merge(&mut self, other: &CoverageTotals) {
        self.entries += other.entries;
        self.entry_bp += other.entry_bp;
        for (total, bp) in self.overlap_bp.iter_mut().zip(&other.overlap_bp) {
            *total += bp;
        }
    }

    /// Fraction of entry bases overlapping category `idx`.
    #[inline]
    pub fn fraction(&self, idx: usize, policy: ZeroLengthPolicy) -> f64 {
        policy.fraction(self.overlap_bp[idx], self.entry_bp)
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_fraction() {
        let mut totals = CoverageTotals::new("chr1", 2);
        assert!(totals.is_empty());
        totals.add_entry(100, &[50, 0]);
        totals.add_entry(100, &[25, 100]);

        assert_eq!(totals.entries, 2);
        assert_eq!(totals.entry_bp, 200);
        assert_eq!(totals.overlap_bp, vec![75, 100]);
        assert_eq!(totals.fraction(0, ZeroLengthPolicy::Error), 0.375);
        assert_eq!(totals.fraction(1, ZeroLengthPolicy::Error), 0.5);
    }

    #[test]
    fn test_merge_matches_sum_of_partitions() {
        let mut chr1 = CoverageTotals::new("chr1", 1);
        chr1.add_entry(100, &[10]);
        let mut chr2 = CoverageTotals::new("chr2", 1);
        chr2.add_entry(50, &[50]);

        let mut genome = CoverageTotals::genomewide(1);
        genome.merge(&chr1);
        genome.merge(&chr2);
        assert_eq!(genome.partition, "genomewide");
        assert_eq!(genome.entry_bp, 150);
        assert_eq!(genome.overlap_bp, vec![60]);
    }

    #[test]
    fn test_empty_fraction_follows_policy() {
        let totals = CoverageTotals::new("chr1", 1);
        assert_eq!(totals.fraction(0, ZeroLengthPolicy::Zero), 0.0);
        assert!(totals.fraction(0, ZeroLengthPolicy::Nan).is_nan());
    }
}
