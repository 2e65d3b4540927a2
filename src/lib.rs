// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

//! annocov: streaming coverage of genomic intervals by annotation categories
//!
//! This library scores sorted BED entries against any number of pre-merged
//! reference categories in a single forward pass, and partitions transcript
//! tables into coding exons, introns and UTRs.
//!
//! # Features
//!
//! - **Streaming I/O**: one pass over every file, memory bounded by the
//!   largest set of references reachable from one entry
//! - **Validation**: sort order and pre-merged references are checked
//!   while streaming
//! - **Gzip**: `.gz` inputs are decompressed transparently
//!
//! # Example
//!
//! ```rust,no_run
//! use annocov::commands::EntrywiseCommand;
//!
//! let cmd = EntrywiseCommand::standard(
//!     "promoters.bed",
//!     "exons.bed",
//!     "introns.bed",
//!     "repeats.bed",
//! );
//! let stats = cmd.run("peaks.bed", "peaks.entrywise.tsv", "peaks.summary.tsv")?;
//! println!("{}", stats);
//! # Ok::<(), annocov::bed::BedError>(())
//! ```

pub mod aggregate;
pub mod bed;
pub mod commands;
pub mod config;
pub mod gene_model;
pub mod interval;
pub mod overlap;
pub mod streaming;

// Re-export commonly used types
pub use bed::{BedError, BedReader};
pub use config::CoverageConfig;
pub use interval::{ContigKey, Interval, IntervalRecord, Strand};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bed::{BedError, BedReader};
    pub use crate::commands::{
        Category, EntrywiseCommand, GeneStatsCommand, MergeCommand, WindowsCommand,
    };
    pub use crate::config::{ChromFilter, CoverageConfig, ReferencePolicy, ZeroLengthPolicy};
    pub use crate::gene_model::{Transcript, TranscriptColumns};
    pub use crate::interval::{ContigKey, IntervalRecord, Strand};
    pub use crate::streaming::{CursorStream, TsvWriter};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_merge_then_score() {
        use crate::bed::BedReader;
        use crate::commands::{EntrywiseCommand, MergeCommand};
        use crate::config::{CoverageConfig, ZeroLengthPolicy};
        use crate::streaming::{CursorStream, TsvWriter};

        let raw = "chr1\t100\t200\nchr1\t150\t250\n";
        let mut merged = Vec::new();
        {
            let cursor = CursorStream::sorted(BedReader::new(raw.as_bytes()), "raw", false).unwrap();
            let mut out = TsvWriter::new(&mut merged);
            MergeCommand::new().run_streaming(cursor, &mut out).unwrap();
        }

        let query = CursorStream::sorted(
            BedReader::new("chr1\t0\t300\n".as_bytes()),
            "query",
            false,
        )
        .unwrap();
        let reference = CursorStream::new(BedReader::new(merged.as_slice()), "merged").unwrap();

        let cmd = EntrywiseCommand::new(Vec::new())
            .with_config(CoverageConfig::new().with_zero_length(ZeroLengthPolicy::Zero));
        let mut entries = Vec::new();
        let mut summary = Vec::new();
        cmd.run_streaming(
            query,
            vec![("merged".to_string(), reference)],
            &mut TsvWriter::new(&mut entries),
            &mut TsvWriter::new(&mut summary),
        )
        .unwrap();

        let entries = String::from_utf8(entries).unwrap();
        assert_eq!(entries.lines().nth(1), Some("chr1\t0\t300\t150\t0.5"));
    }
}
