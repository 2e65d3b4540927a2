//! Active window management for streaming operations.
//!
//! An [`ActiveWindow`] holds the reference intervals of one category that
//! can still overlap the current query or a later one on the same key.

use crate::bed::BedError;
use crate::interval::ContigKey;
use crate::streaming::buffers::DEFAULT_WINDOW_CAPACITY;
use crate::streaming::cursor::CursorStream;
use std::io::Read;

/// Active interval - stores only coordinates.
///
/// The chromosome is tracked once by the window's owner, since a window is
/// cleared whenever the query moves to a new key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveInterval {
    pub start: u64,
    pub end: u64,
}

impl ActiveInterval {
    /// Create a new active interval.
    #[inline]
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Start-ordered buffer of candidates for one category.
///
/// # Memory Complexity
///
/// O(k) where k = max number of candidates reachable from one query.
/// Ends are not monotone (a long interval may be followed by short ones),
/// so eviction scans the whole window instead of advancing a head index.
#[derive(Debug)]
pub struct ActiveWindow {
    data: Vec<ActiveInterval>,
    /// Maximum observed active size (for statistics).
    max_active: usize,
}

impl Default for ActiveWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveWindow {
    /// Create a new empty window.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WINDOW_CAPACITY)
    }

    /// Create a new window with specified initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            max_active: 0,
        }
    }

    /// Add a candidate to the window.
    #[inline]
    pub fn push(&mut self, value: ActiveInterval) {
        self.data.push(value);
        if self.data.len() > self.max_active {
            self.max_active = self.data.len();
        }
    }

    /// Drop candidates that end at or before `query_start`.
    ///
    /// Queries arrive in non-decreasing start order, so such a candidate can
    /// never overlap this query or any later one. Order is preserved.
    ///
    /// Returns the number of candidates removed.
    #[inline]
    pub fn evict_before(&mut self, query_start: u64) -> usize {
        let before = self.data.len();
        self.data.retain(|c| c.end > query_start);
        before - self.data.len()
    }

    /// Pull candidates from `cursor` while they are on `key` and start at or
    /// before `query_end`.
    ///
    /// A record starting beyond the query end is left in the cursor for a
    /// later query. Returns the number of candidates admitted.
    pub fn admit<R: Read>(
        &mut self,
        cursor: &mut CursorStream<R>,
        key: &ContigKey,
        query_end: u64,
    ) -> Result<usize, BedError> {
        let mut admitted = 0;
        while let Some(rec) = cursor.peek() {
            if !key.matches(rec) || rec.start() > query_end {
                break;
            }
            self.push(ActiveInterval::new(rec.start(), rec.end()));
            admitted += 1;
            cursor.advance()?;
        }
        Ok(admitted)
    }

    /// Clear all candidates (on a key change).
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Get the number of active candidates.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a slice of all active candidates, in start order.
    #[inline]
    pub fn as_slice(&self) -> &[ActiveInterval] {
        &self.data
    }

    /// Get the maximum active size observed (for statistics).
    pub fn max_active(&self) -> usize {
        self.max_active
    }
}
