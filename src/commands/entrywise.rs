//! Entrywise coverage of query intervals by reference categories.
//!
//! Every entry of a sorted query file is scored against an ordered list of
//! named reference categories (promoters, exons, introns, repeats, UTRs,
//! or anything else). For each entry and each category the number of
//! overlapping bases and the overlapping fraction of the entry are
//! reported, together with per-chromosome and genome-wide summaries.
//!
//! # Algorithm
//!
//! One [`CursorStream`] and one [`ActiveWindow`] per category advance in
//! lockstep with the query:
//! 1. On a new key, clear every window and fast-forward every cursor to it
//! 2. Evict candidates ending at or before the entry start
//! 3. Admit candidates starting at or before the entry end
//! 4. Sum the clipped overlap of the window
//!
//! # Memory Complexity
//!
//! O(k) per category where k = max candidates reachable from one entry.
//!
//! # Requirements
//!
//! All files MUST be sorted by chromosome, then by start position, with
//! chromosomes in the same order. Reference files must be pre-merged (see
//! [`ReferencePolicy`](crate::config::ReferencePolicy)).

use crate::aggregate::CoverageTotals;
use crate::bed::BedError;
use crate::config::{CoverageConfig, ZeroLengthPolicy};
use crate::interval::{ContigKey, IntervalRecord};
use crate::overlap::summed_overlap;
use crate::streaming::{ActiveWindow, CursorStream, TsvWriter};
use log::{debug, info};
use rustc_hash::FxHashSet;
use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Entries between progress log lines.
const PROGRESS_INTERVAL: usize = 100_000;

/// A named reference track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub path: PathBuf,
}

impl Category {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Parse a `name=path` argument.
    pub fn parse(arg: &str) -> Result<Self, BedError> {
        match arg.split_once('=') {
            Some((name, path))
                if !name.is_empty()
                    && !path.is_empty()
                    && !name.contains(char::is_whitespace) =>
            {
                Ok(Self::new(name, path))
            }
            _ => Err(BedError::InvalidFormat(format!(
                "category '{}' must look like name=path",
                arg
            ))),
        }
    }
}

/// Column names of the entrywise table.
pub fn entry_header(categories: &[String]) -> Vec<String> {
    let mut columns = vec!["chr".to_string(), "start".to_string(), "end".to_string()];
    columns.extend(category_columns(categories));
    columns
}

/// Column names of the summary table.
pub fn summary_header(categories: &[String]) -> Vec<String> {
    let mut columns = vec!["partition".to_string()];
    columns.extend(category_columns(categories));
    columns
}

fn category_columns(categories: &[String]) -> impl Iterator<Item = String> + '_ {
    categories
        .iter()
        .flat_map(|name| [format!("{}_bp", name), format!("{}_pct", name)])
}

/// Entrywise coverage command configuration.
#[derive(Debug, Clone)]
pub struct EntrywiseCommand {
    pub categories: Vec<Category>,
    pub config: CoverageConfig,
}

impl EntrywiseCommand {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories,
            config: CoverageConfig::default(),
        }
    }

    /// promoter, exon, intron and repeat, in that order.
    pub fn standard<P: Into<PathBuf>>(promoter: P, exon: P, intron: P, repeat: P) -> Self {
        Self::new(vec![
            Category::new("promoter", promoter),
            Category::new("exon", exon),
            Category::new("intron", intron),
            Category::new("repeat", repeat),
        ])
    }

    /// Put whole 5' and 3' UTR categories in front.
    pub fn with_utrs<P: Into<PathBuf>>(mut self, fp_utr: P, tp_utr: P) -> Self {
        self.categories.splice(
            0..0,
            [
                Category::new("fp_utr", fp_utr),
                Category::new("tp_utr", tp_utr),
            ],
        );
        self
    }

    /// Put UTR categories split into exonic and intronic parts in front.
    pub fn with_split_utrs<P: Into<PathBuf>>(
        mut self,
        fp_utr_exon: P,
        fp_utr_intron: P,
        tp_utr_exon: P,
        tp_utr_intron: P,
    ) -> Self {
        self.categories.splice(
            0..0,
            [
                Category::new("fp_utr_exon", fp_utr_exon),
                Category::new("fp_utr_intron", fp_utr_intron),
                Category::new("tp_utr_exon", tp_utr_exon),
                Category::new("tp_utr_intron", tp_utr_intron),
            ],
        );
        self
    }

    /// Append a category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.push(category);
        self
    }

    pub fn with_config(mut self, config: CoverageConfig) -> Self {
        self.config = config;
        self
    }

    /// Category names, in output order.
    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    /// Score a query file against every category, writing the entrywise
    /// table to `entry_path` and the summary table to `summary_path`.
    pub fn run<P: AsRef<Path>>(
        &self,
        input: P,
        entry_path: P,
        summary_path: P,
    ) -> Result<EntrywiseStats, BedError> {
        let stranded = self.config.stranded;
        let mut references = Vec::with_capacity(self.categories.len());
        for category in &self.categories {
            let cursor =
                CursorStream::open(&category.path, self.config.reference_policy, stranded)?;
            references.push((category.name.clone(), cursor));
        }
        let query = CursorStream::open_query(input, self.config.assume_sorted, stranded)?;

        let mut entry_out = TsvWriter::create(entry_path)?;
        let mut summary_out = TsvWriter::create(summary_path)?;
        self.run_streaming(query, references, &mut entry_out, &mut summary_out)
    }

    /// Core streaming loop over already opened cursors.
    pub fn run_streaming<Q: Read, R: Read, W1: Write, W2: Write>(
        &self,
        mut query: CursorStream<Q>,
        references: Vec<(String, CursorStream<R>)>,
        entry_out: &mut TsvWriter<W1>,
        summary_out: &mut TsvWriter<W2>,
    ) -> Result<EntrywiseStats, BedError> {
        let mut engine = CoverageEngine::new(references, self.config.clone())?;
        let policy = self.config.zero_length;

        entry_out.write_header(&entry_header(engine.categories()))?;
        summary_out.write_header(&summary_header(engine.categories()))?;

        while let Some(entry) = query.next_record()? {
            let flushed = match engine.process(&entry)? {
                EntryOutcome::Skipped => continue,
                EntryOutcome::Scored { flushed } => flushed,
            };
            if let Some(totals) = flushed {
                write_summary_row(summary_out, &totals, policy)?;
            }

            entry_out.write_bed3(entry.chrom(), entry.start(), entry.end())?;
            let length = entry.len();
            for &bp in engine.overlaps() {
                entry_out.write_bp_fraction(bp, policy.fraction(bp, length))?;
            }
            entry_out.write_newline()?;
        }

        let (last, genome) = engine.finish();
        if let Some(totals) = last {
            write_summary_row(summary_out, &totals, policy)?;
        }
        write_summary_row(summary_out, &genome, policy)?;

        entry_out.flush()?;
        summary_out.flush()?;
        Ok(engine.stats().clone())
    }
}

fn write_summary_row<W: Write>(
    out: &mut TsvWriter<W>,
    totals: &CoverageTotals,
    policy: ZeroLengthPolicy,
) -> Result<(), BedError> {
    out.write_str(&totals.partition)?;
    for (idx, &bp) in totals.overlap_bp.iter().enumerate() {
        out.write_bp_fraction(bp, totals.fraction(idx, policy))?;
    }
    out.write_newline()
}

/// What the engine did with one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The entry's chromosome is filtered out; nothing was recorded.
    Skipped,
    /// The entry was scored. `flushed` holds the previous chromosome's
    /// totals when this entry started a new chromosome.
    Scored { flushed: Option<CoverageTotals> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EngineState {
    AwaitingFirstEntry,
    Processing(ContigKey),
    Finished,
}

/// Drives the per-category cursors and windows over a query stream and
/// keeps the chromosome and genome totals.
///
/// Entries must be fed in sorted order through [`process`](Self::process);
/// [`finish`](Self::finish) ends the run.
pub struct CoverageEngine<R: Read> {
    categories: Vec<String>,
    cursors: Vec<CursorStream<R>>,
    windows: Vec<ActiveWindow>,
    config: CoverageConfig,
    state: EngineState,
    chromosome: Option<CoverageTotals>,
    genome: CoverageTotals,
    /// Per-category overlap of the last scored entry.
    overlaps: Vec<u64>,
    last_skipped: Option<String>,
    stats: EntrywiseStats,
}

impl<R: Read> CoverageEngine<R> {
    pub fn new(
        references: Vec<(String, CursorStream<R>)>,
        config: CoverageConfig,
    ) -> Result<Self, BedError> {
        if references.is_empty() {
            return Err(BedError::InvalidFormat(
                "at least one reference category is required".to_string(),
            ));
        }
        let mut seen = FxHashSet::default();
        let mut categories = Vec::with_capacity(references.len());
        let mut cursors = Vec::with_capacity(references.len());
        for (name, cursor) in references {
            if !seen.insert(name.clone()) {
                return Err(BedError::InvalidFormat(format!(
                    "category '{}' given more than once",
                    name
                )));
            }
            categories.push(name);
            cursors.push(cursor);
        }

        let n = categories.len();
        Ok(Self {
            categories,
            cursors,
            windows: (0..n).map(|_| ActiveWindow::new()).collect(),
            config,
            state: EngineState::AwaitingFirstEntry,
            chromosome: None,
            genome: CoverageTotals::genomewide(n),
            overlaps: vec![0; n],
            last_skipped: None,
            stats: EntrywiseStats::default(),
        })
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Per-category overlap of the most recently scored entry.
    pub fn overlaps(&self) -> &[u64] {
        &self.overlaps
    }

    pub fn stats(&self) -> &EntrywiseStats {
        &self.stats
    }

    /// Score one entry.
    pub fn process(&mut self, entry: &IntervalRecord) -> Result<EntryOutcome, BedError> {
        if self.state == EngineState::Finished {
            return Err(BedError::InvalidFormat(format!(
                "entry {}:{} received after the run finished",
                entry.chrom(),
                entry.start()
            )));
        }
        self.stats.entries_read += 1;

        if self.config.skips_chrom(entry.chrom()) {
            self.stats.entries_skipped += 1;
            if self.last_skipped.as_deref() != Some(entry.chrom()) {
                debug!("Skipping entries on filtered chromosome {}", entry.chrom());
                self.last_skipped = Some(entry.chrom().to_string());
            }
            return Ok(EntryOutcome::Skipped);
        }

        let length = entry.len();
        if length == 0 && self.config.zero_length == ZeroLengthPolicy::Error {
            return Err(BedError::ZeroLengthEntry {
                chrom: entry.chrom().to_string(),
                start: entry.start(),
            });
        }

        let key = entry.key(self.config.stranded);
        let flushed = self.enter(&key)?;

        let (start, end) = (entry.start(), entry.end());
        for ((window, cursor), bp) in self
            .windows
            .iter_mut()
            .zip(self.cursors.iter_mut())
            .zip(self.overlaps.iter_mut())
        {
            window.evict_before(start);
            window.admit(cursor, &key, end)?;
            *bp = summed_overlap(start, end, window.as_slice());
        }

        if let Some(totals) = self.chromosome.as_mut() {
            totals.add_entry(length, &self.overlaps);
        }
        self.stats.entries_scored += 1;
        if self.stats.entries_scored % PROGRESS_INTERVAL == 0 {
            info!("Scored {} entries", self.stats.entries_scored);
        }

        Ok(EntryOutcome::Scored { flushed })
    }

    /// Move to `key` if it differs from the current one.
    fn enter(&mut self, key: &ContigKey) -> Result<Option<CoverageTotals>, BedError> {
        if matches!(&self.state, EngineState::Processing(current) if current == key) {
            return Ok(None);
        }

        for window in &mut self.windows {
            window.clear();
        }
        for cursor in &mut self.cursors {
            let skipped = cursor.fast_forward(key)?;
            if skipped > 0 {
                debug!("{}: skipped {} records to reach {}", cursor.label(), skipped, key);
            }
        }

        // Strand blocks of one chromosome share a summary row.
        let new_chromosome = self
            .chromosome
            .as_ref()
            .is_none_or(|totals| totals.partition != key.chrom);
        let mut flushed = None;
        if new_chromosome {
            flushed = self.flush_chromosome();
            info!("Parsing chromosome {}", key.chrom);
            self.chromosome = Some(CoverageTotals::new(
                key.chrom.clone(),
                self.categories.len(),
            ));
            self.stats.chromosomes += 1;
        }

        self.state = EngineState::Processing(key.clone());
        Ok(flushed)
    }

    fn flush_chromosome(&mut self) -> Option<CoverageTotals> {
        let totals = self.chromosome.take()?;
        self.genome.merge(&totals);
        Some(totals)
    }

    /// End the run: returns the last chromosome's totals (None if nothing
    /// was scored) and the genome-wide totals.
    pub fn finish(&mut self) -> (Option<CoverageTotals>, CoverageTotals) {
        let last = self.flush_chromosome();
        self.state = EngineState::Finished;
        self.stats.reference_records = self.cursors.iter().map(|c| c.records_read()).sum();
        self.stats.max_active = self
            .windows
            .iter()
            .map(|w| w.max_active())
            .max()
            .unwrap_or(0);
        info!(
            "Finished: {} entries scored on {} chromosomes",
            self.stats.entries_scored, self.stats.chromosomes
        );
        (last, self.genome.clone())
    }
}

/// Statistics from an entrywise run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EntrywiseStats {
    /// Query entries read
    pub entries_read: usize,
    /// Entries scored and written
    pub entries_scored: usize,
    /// Entries on filtered chromosomes
    pub entries_skipped: usize,
    pub chromosomes: usize,
    /// Reference records read across all categories
    pub reference_records: usize,
    /// Largest window size seen in any category
    pub max_active: usize,
}

impl fmt::Display for EntrywiseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entries: {}, Scored: {}, Skipped: {}, Chromosomes: {}, Reference records: {}, Max active: {}",
            self.entries_read,
            self.entries_scored,
            self.entries_skipped,
            self.chromosomes,
            self.reference_records,
            self.max_active
        )
    }
}
