//! Command implementations for annocov.

pub mod entrywise;
pub mod gene_stats;
pub mod merge;
pub mod windows;

pub use entrywise::{
    entry_header, summary_header, Category, CoverageEngine, EntryOutcome, EntrywiseCommand,
    EntrywiseStats,
};
pub use gene_stats::{
    GeneStats, GeneStatsCommand, GeneStatsSummary, RegionStats, GENE_STATS_HEADER,
};
pub use merge::{merged_path, MergeCommand, MergeStats};
pub use windows::{WindowsCommand, WindowsStats};
