//! Base-pair overlap between a query span and a window of candidates.
//!
//! Two measures are provided:
//!
//! - [`summed_overlap`]: the clipped length of every candidate, added up.
//!   Only meaningful when the candidates do not overlap each other, which
//!   the reference cursors guarantee (validated or merged on the fly).
//! - [`union_overlap`]: the clipped candidates are merged first, so bases
//!   covered by several candidates count once. Used for peak sets, which
//!   routinely overlap.
//!
//! Both take the candidates as stored in an active window: start-sorted,
//! chromosome implied.

use crate::interval::clipped_length;
use crate::streaming::ActiveInterval;

/// Result of a union overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlapSummary {
    /// Candidates sharing at least one base with the query.
    pub hits: usize,
    /// Distinct query bases covered by any candidate.
    pub bases: u64,
}

/// Sum of the candidates' clipped overlap with `[start, end)`.
#[inline]
pub fn summed_overlap(start: u64, end: u64, candidates: &[ActiveInterval]) -> u64 {
    candidates
        .iter()
        .map(|c| clipped_length(c.start, c.end, start, end))
        .sum()
}

/// Union of the candidates' clipped overlap with `[start, end)`.
///
/// INVARIANT: candidates are sorted by start, so a single merge pass
/// suffices.
pub fn union_overlap(start: u64, end: u64, candidates: &[ActiveInterval]) -> OverlapSummary {
    let mut summary = OverlapSummary::default();
    let mut merger = IntervalMerger::new(0);

    for c in candidates {
        if c.start >= end {
            break;
        }
        if c.end <= start {
            continue;
        }
        let clip = ActiveInterval::new(c.start.max(start), c.end.min(end));
        if clip.is_empty() {
            continue;
        }
        summary.hits += 1;
        if let Some(done) = merger.push(clip) {
            summary.bases += done.span.len();
        }
    }
    if let Some(done) = merger.finish() {
        summary.bases += done.span.len();
    }

    summary
}

/// A merged span and the number of input spans folded into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merged {
    pub span: ActiveInterval,
    pub count: usize,
}

/// Streaming merge of start-sorted spans.
///
/// Tracks the current merged span and hands it back once a span arrives
/// that starts more than `distance` bases past its end.
#[derive(Debug, Clone)]
pub struct IntervalMerger {
    distance: u64,
    current: Option<Merged>,
}

impl IntervalMerger {
    pub fn new(distance: u64) -> Self {
        Self {
            distance,
            current: None,
        }
    }

    /// Add the next span; returns the previous merged span if this one
    /// does not reach it.
    #[inline]
    pub fn push(&mut self, span: ActiveInterval) -> Option<Merged> {
        match self.current {
            Some(ref mut cur) if span.start <= cur.span.end.saturating_add(self.distance) => {
                cur.span.end = cur.span.end.max(span.end);
                cur.count += 1;
                None
            }
            _ => self.current.replace(Merged { span, count: 1 }),
        }
    }

    /// Flush the last merged span.
    pub fn finish(&mut self) -> Option<Merged> {
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(raw: &[(u64, u64)]) -> Vec<ActiveInterval> {
        raw.iter().map(|&(s, e)| ActiveInterval::new(s, e)).collect()
    }

    #[test]
    fn test_summed_partial_overlap() {
        // exons.bed chr1 100 200 vs entry chr1 150 250
        assert_eq!(summed_overlap(150, 250, &spans(&[(100, 200)])), 50);
    }

    #[test]
    fn test_summed_touching_candidates() {
        let window = spans(&[(10, 20), (20, 30)]);
        assert_eq!(summed_overlap(5, 35, &window), 20);
    }

    #[test]
    fn test_summed_abutting_is_zero() {
        let window = spans(&[(0, 100), (200, 300)]);
        assert_eq!(summed_overlap(100, 200, &window), 0);
    }

    #[test]
    fn test_summed_never_exceeds_query_for_disjoint_window() {
        let window = spans(&[(0, 40), (40, 90), (95, 500)]);
        let bp = summed_overlap(10, 110, &window);
        assert_eq!(bp, 30 + 50 + 15);
        assert!(bp <= 100);
    }

    #[test]
    fn test_union_counts_shared_bases_once() {
        let window = spans(&[(100, 150), (125, 175)]);
        let summary = union_overlap(100, 200, &window);
        assert_eq!(summary.hits, 2);
        assert_eq!(summary.bases, 75);
    }

    #[test]
    fn test_union_disjoint() {
        let window = spans(&[(100, 120), (150, 180)]);
        let summary = union_overlap(100, 200, &window);
        assert_eq!(summary, OverlapSummary { hits: 2, bases: 50 });
    }

    #[test]
    fn test_union_skips_abutting_and_distant() {
        let window = spans(&[(0, 100), (100, 110), (200, 300)]);
        let summary = union_overlap(100, 200, &window);
        assert_eq!(summary, OverlapSummary { hits: 1, bases: 10 });
    }

    #[test]
    fn test_union_nested_candidates() {
        let window = spans(&[(0, 1000), (10, 20), (30, 40)]);
        let summary = union_overlap(5, 50, &window);
        assert_eq!(summary.hits, 3);
        assert_eq!(summary.bases, 45);
    }

    #[test]
    fn test_merger_counts() {
        let mut merger = IntervalMerger::new(0);
        assert!(merger.push(ActiveInterval::new(0, 10)).is_none());
        assert!(merger.push(ActiveInterval::new(5, 15)).is_none());
        let done = merger.push(ActiveInterval::new(20, 30)).unwrap();
        assert_eq!(done.span, ActiveInterval::new(0, 15));
        assert_eq!(done.count, 2);
        let last = merger.finish().unwrap();
        assert_eq!(last.count, 1);
        assert!(merger.finish().is_none());
    }
}
