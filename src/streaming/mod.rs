//! Shared streaming components.
//!
//! This module provides the pieces every command is built from:
//! - Byte-level field parsing
//! - Inline sort validation
//! - Forward-only cursors over sorted files
//! - Per-category active windows
//! - Table output formatting
//!
//! All streaming commands hold O(k) memory where k = the largest number of
//! reference intervals reachable from one query.

pub mod active_set;
pub mod buffers;
pub mod cursor;
pub mod output;
pub mod parsing;
pub mod validation;

pub use active_set::{ActiveInterval, ActiveWindow};
pub use cursor::CursorStream;
pub use output::TsvWriter;
pub use parsing::{parse_u64_fast, parse_u64_list, should_skip_line};
pub use validation::SortValidator;
