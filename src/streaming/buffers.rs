//! Buffer size constants for streaming operations.
//!
//! These constants control memory usage vs I/O throughput tradeoffs.

/// Default output buffer size (2 MB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 2 * 1024 * 1024;

/// Default input buffer size (256 KB).
/// Every category opens its own reader, so this is multiplied by the
/// number of reference tracks.
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Default line buffer capacity (1 KB).
/// Sufficient for most BED lines; transcript rows with many exons grow it.
pub const DEFAULT_LINE_BUFFER: usize = 1024;

/// Initial capacity of each category's active window.
pub const DEFAULT_WINDOW_CAPACITY: usize = 256;
