//! Per-transcript coverage statistics of a peak file.
//!
//! Each transcript of a gene-prediction table is partitioned into coding
//! exons, introns and UTRs, and every part is scored against the peaks on
//! the same chromosome and strand. Peaks may overlap each other: bases are
//! counted once (union) while every overlapping peak counts as a hit.
//!
//! # Requirements
//!
//! Both files MUST be sorted by chromosome, strand, then start position,
//! with chromosome and strand in byte order (`LC_ALL=C sort`), and peaks
//! need a strand in column 6. Peaks on a key with no transcripts, or on a
//! filtered chromosome, are dropped once the transcripts move past it.

use crate::bed::{BedError, BedReader};
use crate::config::{CoverageConfig, ReferencePolicy};
use crate::gene_model::{GeneModel, Span, Transcript, TranscriptColumns, TranscriptReader};
use crate::interval::ContigKey;
use crate::overlap::union_overlap;
use crate::streaming::{ActiveInterval, ActiveWindow, CursorStream, SortValidator, TsvWriter};
use log::{debug, info};
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

/// Output columns, in order.
pub const GENE_STATS_HEADER: [&str; 26] = [
    "refseq",
    "symbol",
    "covered_exons",
    "total_exons",
    "prop_exon_bases",
    "exon_bases_covered",
    "exonic_bases",
    "exonic_hits",
    "covered_introns",
    "total_introns",
    "prop_intron_bases",
    "intron_bases_covered",
    "intronic_bases",
    "intronic_hits",
    "tp_utr_bases",
    "tp_utr_bases_covered",
    "tp_utr_hits",
    "tp_utr_prop",
    "fp_utr_bases",
    "fp_utr_bases_covered",
    "fp_utr_hits",
    "fp_utr_prop",
    "total_bases_covered",
    "prop_bases_covered",
    "total_bases",
    "total_hits",
];

/// Coverage of one kind of transcript region (all exons, all introns, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionStats {
    /// Regions of this kind
    pub regions: usize,
    /// Regions with at least one overlapping peak
    pub covered: usize,
    pub bases: u64,
    pub bases_covered: u64,
    /// Peaks overlapping a region, counted once per region
    pub hits: usize,
}

impl RegionStats {
    /// Score `spans` against a start-sorted peak window.
    pub fn score(spans: &[Span], peaks: &[ActiveInterval]) -> Self {
        let mut stats = Self::default();
        for span in spans {
            stats.add(*span, peaks);
        }
        stats
    }

    fn add(&mut self, span: Span, peaks: &[ActiveInterval]) {
        let overlap = union_overlap(span.start, span.end, peaks);
        self.regions += 1;
        self.bases += span.len();
        if overlap.hits > 0 {
            self.covered += 1;
            self.bases_covered += overlap.bases;
            self.hits += overlap.hits;
            debug!(
                "  [{}, {}): {} peaks, {} bases",
                span.start, span.end, overlap.hits, overlap.bases
            );
        }
    }

    /// Covered fraction of the region bases, 0 when there are none.
    pub fn proportion(&self) -> f64 {
        if self.bases == 0 {
            0.0
        } else {
            self.bases_covered as f64 / self.bases as f64
        }
    }
}

/// Statistics row of one transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneStats {
    pub refseq: String,
    pub symbol: String,
    pub exons: RegionStats,
    pub introns: RegionStats,
    pub tp_utr: RegionStats,
    pub fp_utr: RegionStats,
    /// Transcript length
    pub total_bases: u64,
}

impl GeneStats {
    /// Score a partitioned transcript against its peak window.
    pub fn compute(transcript: &Transcript, model: &GeneModel, peaks: &[ActiveInterval]) -> Self {
        Self {
            refseq: transcript.name.clone(),
            symbol: transcript.name2.clone(),
            exons: RegionStats::score(&model.coding_exons, peaks),
            introns: RegionStats::score(&model.introns, peaks),
            tp_utr: RegionStats::score(&[model.tp_utr], peaks),
            fp_utr: RegionStats::score(&[model.fp_utr], peaks),
            total_bases: transcript.len(),
        }
    }

    pub fn total_bases_covered(&self) -> u64 {
        self.exons.bases_covered
            + self.introns.bases_covered
            + self.tp_utr.bases_covered
            + self.fp_utr.bases_covered
    }

    pub fn total_hits(&self) -> usize {
        self.exons.hits + self.introns.hits + self.tp_utr.hits + self.fp_utr.hits
    }

    pub fn prop_bases_covered(&self) -> f64 {
        if self.total_bases == 0 {
            0.0
        } else {
            self.total_bases_covered() as f64 / self.total_bases as f64
        }
    }

    /// Write the row in [`GENE_STATS_HEADER`] order.
    pub fn write<W: Write>(&self, out: &mut TsvWriter<W>) -> Result<(), BedError> {
        out.write_str(&self.refseq)?;
        out.write_tab()?;
        out.write_str(&self.symbol)?;
        for region in [&self.exons, &self.introns] {
            out.write_tab()?;
            out.write_int(region.covered)?;
            out.write_tab()?;
            out.write_int(region.regions)?;
            out.write_tab()?;
            out.write_float(region.proportion())?;
            out.write_tab()?;
            out.write_int(region.bases_covered)?;
            out.write_tab()?;
            out.write_int(region.bases)?;
            out.write_tab()?;
            out.write_int(region.hits)?;
        }
        for utr in [&self.tp_utr, &self.fp_utr] {
            out.write_tab()?;
            out.write_int(utr.bases)?;
            out.write_tab()?;
            out.write_int(utr.bases_covered)?;
            out.write_tab()?;
            out.write_int(utr.hits)?;
            out.write_tab()?;
            out.write_float(utr.proportion())?;
        }
        out.write_tab()?;
        out.write_int(self.total_bases_covered())?;
        out.write_tab()?;
        out.write_float(self.prop_bases_covered())?;
        out.write_tab()?;
        out.write_int(self.total_bases)?;
        out.write_tab()?;
        out.write_int(self.total_hits())?;
        out.write_newline()
    }
}

/// Gene-stats command configuration.
///
/// Of the shared configuration only the chromosome filter and
/// `assume_sorted` apply; runs are always stranded.
#[derive(Debug, Clone, Default)]
pub struct GeneStatsCommand {
    pub columns: TranscriptColumns,
    pub config: CoverageConfig,
}

impl GeneStatsCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(mut self, columns: TranscriptColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_config(mut self, config: CoverageConfig) -> Self {
        self.config = config;
        self
    }

    /// Score every transcript of `reference` against the peaks in `bed`.
    pub fn run<P: AsRef<Path>>(
        &self,
        reference: P,
        bed: P,
        output: P,
    ) -> Result<GeneStatsSummary, BedError> {
        let transcripts = TranscriptReader::from_path(reference, self.columns.clone())?;
        let peaks = CursorStream::open_query(bed, self.config.assume_sorted, true)?.with_key_order();
        let mut out = TsvWriter::create(output)?;
        self.run_streaming(transcripts, peaks, &mut out)
    }

    /// Score transcripts from an in-memory table (useful for testing).
    pub fn run_str<W: Write>(
        &self,
        reference: &str,
        bed: &str,
        out: &mut TsvWriter<W>,
    ) -> Result<GeneStatsSummary, BedError> {
        let transcripts =
            TranscriptReader::new(BedReader::new(reference.as_bytes()), self.columns.clone());
        let peaks = if self.config.assume_sorted {
            CursorStream::with_options(
                BedReader::new(bed.as_bytes()),
                "peaks",
                ReferencePolicy::Assume,
                true,
            )?
        } else {
            CursorStream::sorted(BedReader::new(bed.as_bytes()), "peaks", true)?.with_key_order()
        };
        self.run_streaming(transcripts, peaks, out)
    }

    /// Core streaming loop.
    pub fn run_streaming<R1: Read, R2: Read, W: Write>(
        &self,
        mut transcripts: TranscriptReader<R1>,
        mut peaks: CursorStream<R2>,
        out: &mut TsvWriter<W>,
    ) -> Result<GeneStatsSummary, BedError> {
        let mut summary = GeneStatsSummary::default();
        let mut window = ActiveWindow::new();
        let mut validator = (!self.config.assume_sorted)
            .then(|| SortValidator::new("transcript table").with_key_order(true));
        let mut current: Option<ContigKey> = None;

        out.write_header(&GENE_STATS_HEADER)?;

        while let Some(transcript) = transcripts.read_transcript()? {
            summary.transcripts_read += 1;
            let key = transcript.key();
            if let Some(v) = validator.as_mut() {
                v.validate(&key, transcript.tx_start, transcript.tx_end)?;
            }

            if self.config.skips_chrom(&transcript.chrom) {
                summary.transcripts_skipped += 1;
                debug!("Skipping {} on filtered chromosome", transcript.name);
                continue;
            }

            if current.as_ref() != Some(&key) {
                window.clear();
                let skipped = peaks.skip_before(&key)?;
                if skipped > 0 {
                    debug!("Dropped {} peaks before {}", skipped, key);
                }
                info!("Parsing {}", key);
                current = Some(key.clone());
            }

            window.evict_before(transcript.tx_start);
            window.admit(&mut peaks, &key, transcript.tx_end)?;

            debug!("Computing statistics on {}", transcript);
            let model = transcript.partition();
            if model.coding {
                debug!("{}", model);
            } else {
                summary.non_coding += 1;
                debug!("Non-coding transcript");
            }

            let stats = GeneStats::compute(&transcript, &model, window.as_slice());
            stats.write(out)?;
            summary.transcripts_scored += 1;
        }

        out.flush()?;
        summary.peaks_read = peaks.records_read();
        summary.max_active = window.max_active();
        info!("Analysis complete: {} transcripts scored", summary.transcripts_scored);
        Ok(summary)
    }
}

/// Statistics from a gene-stats run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeneStatsSummary {
    pub transcripts_read: usize,
    pub transcripts_scored: usize,
    /// Transcripts on filtered chromosomes
    pub transcripts_skipped: usize,
    pub non_coding: usize,
    pub peaks_read: usize,
    /// Largest peak window seen
    pub max_active: usize,
}

impl fmt::Display for GeneStatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transcripts: {}, Scored: {}, Skipped: {}, Non-coding: {}, Peaks: {}, Max active: {}",
            self.transcripts_read,
            self.transcripts_scored,
            self.transcripts_skipped,
            self.non_coding,
            self.peaks_read,
            self.max_active
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChromFilter;

    const NM_PLUS: &str =
        "0\tNM_1\tchr1\t+\t100\t1000\t150\t900\t3\t100,400,800,\t200,500,1000,\t0\tGENE1\n";

    fn run_with(
        cmd: &GeneStatsCommand,
        reference: &str,
        bed: &str,
    ) -> Result<Vec<Vec<String>>, BedError> {
        let mut buf = Vec::new();
        {
            let mut out = TsvWriter::new(&mut buf);
            cmd.run_str(reference, bed, &mut out)?;
        }
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), GENE_STATS_HEADER.join("\t"));
        Ok(lines
            .map(|l| l.split('\t').map(String::from).collect())
            .collect())
    }

    fn run(reference: &str, bed: &str) -> Vec<Vec<String>> {
        run_with(&GeneStatsCommand::new(), reference, bed).unwrap()
    }

    fn column(row: &[String], name: &str) -> String {
        let idx = GENE_STATS_HEADER.iter().position(|c| *c == name).unwrap();
        row[idx].clone()
    }

    #[test]
    fn test_overlapping_peaks_counted_once_in_bases() {
        // Two overlapping peaks over the second exon [400, 500)
        let rows = run(
            NM_PLUS,
            "chr1\t410\t450\tp1\t0\t+\nchr1\t430\t470\tp2\t0\t+\n",
        );
        let row = &rows[0];
        assert_eq!(column(row, "refseq"), "NM_1");
        assert_eq!(column(row, "symbol"), "GENE1");
        assert_eq!(column(row, "covered_exons"), "1");
        assert_eq!(column(row, "total_exons"), "3");
        assert_eq!(column(row, "exon_bases_covered"), "60");
        assert_eq!(column(row, "exonic_bases"), "250");
        assert_eq!(column(row, "prop_exon_bases"), "0.24");
        assert_eq!(column(row, "exonic_hits"), "2");
        assert_eq!(column(row, "total_hits"), "2");
        assert_eq!(column(row, "total_bases"), "900");
    }

    #[test]
    fn test_peak_spanning_exon_and_intron() {
        let rows = run(NM_PLUS, "chr1\t180\t220\tp\t0\t+\n");
        let row = &rows[0];
        assert_eq!(column(row, "exon_bases_covered"), "20");
        assert_eq!(column(row, "intron_bases_covered"), "20");
        assert_eq!(column(row, "covered_introns"), "1");
        assert_eq!(column(row, "total_introns"), "2");
        assert_eq!(column(row, "intronic_bases"), "500");
        assert_eq!(column(row, "total_bases_covered"), "40");
        assert_eq!(column(row, "total_hits"), "2");
    }

    #[test]
    fn test_abutting_peak_is_not_a_hit() {
        // Ends exactly where the 5' UTR starts
        let rows = run(NM_PLUS, "chr1\t50\t100\tp\t0\t+\n");
        assert_eq!(column(&rows[0], "total_hits"), "0");
        assert_eq!(column(&rows[0], "prop_bases_covered"), "0.0");
    }

    #[test]
    fn test_minus_strand_utr_labels() {
        let reference =
            "0\tNM_2\tchr1\t-\t100\t1000\t150\t900\t3\t100,400,800,\t200,500,1000,\t0\tGENE2\n";
        // Peak in the low-coordinate UTR, the 3' end of a minus-strand gene
        let rows = run(reference, "chr1\t100\t150\tp\t0\t-\n");
        let row = &rows[0];
        assert_eq!(column(row, "tp_utr_bases"), "50");
        assert_eq!(column(row, "tp_utr_bases_covered"), "50");
        assert_eq!(column(row, "tp_utr_prop"), "1.0");
        assert_eq!(column(row, "fp_utr_bases"), "100");
        assert_eq!(column(row, "fp_utr_hits"), "0");
    }

    #[test]
    fn test_opposite_strand_peaks_ignored() {
        let rows = run(NM_PLUS, "chr1\t410\t450\tp\t0\t-\n");
        assert_eq!(column(&rows[0], "total_hits"), "0");
    }

    #[test]
    fn test_non_coding_transcript() {
        let reference =
            "0\tNR_1\tchr1\t+\t100\t1000\t1000\t1000\t2\t100,800,\t200,1000,\t0\tLNC\n";
        let rows = run(reference, "chr1\t100\t200\tp\t0\t+\n");
        let row = &rows[0];
        for col in ["covered_exons", "total_exons", "exonic_bases", "total_introns"] {
            assert_eq!(column(row, col), "0");
        }
        assert_eq!(column(row, "prop_exon_bases"), "0.0");
        assert_eq!(column(row, "fp_utr_bases"), "900");
        assert_eq!(column(row, "fp_utr_bases_covered"), "100");
        assert_eq!(column(row, "tp_utr_bases"), "0");
        assert_eq!(column(row, "tp_utr_prop"), "0.0");
    }

    #[test]
    fn test_peaks_shared_by_overlapping_transcripts() {
        let reference = format!(
            "{}0\tNM_7\tchr1\t+\t400\t1200\t450\t1100\t1\t400,\t1200,\t0\tGENE7\n",
            NM_PLUS
        );
        let rows = run(&reference, "chr1\t410\t450\tp\t0\t+\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(column(&rows[0], "total_hits"), "1");
        assert_eq!(column(&rows[1], "total_hits"), "1");
        assert_eq!(column(&rows[1], "fp_utr_bases_covered"), "40");
    }

    #[test]
    fn test_strand_without_peaks_keeps_later_peaks() {
        let reference = format!(
            "{}0\tNM_8\tchr1\t-\t100\t300\t150\t250\t1\t100,\t300,\t0\tG8\n\
             0\tNM_9\tchr2\t+\t100\t300\t150\t250\t1\t100,\t300,\t0\tG9\n",
            NM_PLUS
        );
        // chr1 minus has no peaks at all
        let rows = run(&reference, "chr1\t410\t450\tp\t0\t+\nchr2\t160\t170\tq\t0\t+\n");
        assert_eq!(column(&rows[1], "total_hits"), "0");
        assert_eq!(column(&rows[2], "exon_bases_covered"), "10");
    }

    #[test]
    fn test_filtered_transcripts_skipped() {
        let config =
            CoverageConfig::new().with_chrom_filter(Some(ChromFilter::non_reference().unwrap()));
        let cmd = GeneStatsCommand::new().with_config(config);
        let reference = format!(
            "{}0\tNM_M\tchrM\t+\t0\t100\t0\t100\t1\t0,\t100,\t0\tMT\n",
            NM_PLUS
        );
        let rows = run_with(&cmd, &reference, "").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "NM_1");
    }

    #[test]
    fn test_peaks_on_key_without_transcripts_dropped() {
        let reference = format!(
            "{}0\tNM_9\tchr2\t+\t100\t1000\t150\t900\t1\t100,\t1000,\t0\tG9\n",
            NM_PLUS
        );
        // chr1 minus has peaks but no transcripts
        let peaks = "chr1\t410\t450\tp\t0\t+\n\
                     chr1\t300\t320\tq\t0\t-\n\
                     chr2\t200\t300\tr\t0\t+\n";
        let rows = run(&reference, peaks);
        assert_eq!(column(&rows[0], "total_hits"), "1");
        assert_eq!(column(&rows[1], "total_hits"), "1");
        assert_eq!(column(&rows[1], "exon_bases_covered"), "100");
    }

    #[test]
    fn test_peaks_on_filtered_chromosome_dropped() {
        let config =
            CoverageConfig::new().with_chrom_filter(Some(ChromFilter::non_reference().unwrap()));
        let cmd = GeneStatsCommand::new().with_config(config);
        let reference = "0\tNM_M\tchrM\t+\t0\t100\t0\t100\t1\t0,\t100,\t0\tMT\n\
                         0\tNM_X\tchrX\t+\t100\t1000\t150\t900\t1\t100,\t1000,\t0\tGX\n";
        let peaks = "chrM\t10\t20\tp\t0\t+\nchrX\t200\t300\tq\t0\t+\n";
        let rows = run_with(&cmd, reference, peaks).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "NM_X");
        assert_eq!(column(&rows[0], "total_hits"), "1");
    }

    #[test]
    fn test_peaks_out_of_byte_order_rejected() {
        // Genome order puts chr9 before chr10
        let reference = NM_PLUS.replace("chr1", "chr9");
        let peaks = "chr9\t410\t450\tp\t0\t+\nchr10\t10\t20\tq\t0\t+\n";
        let err = run_with(&GeneStatsCommand::new(), &reference, peaks).unwrap_err();
        assert!(matches!(err, BedError::Unsorted { .. }));
    }

    #[test]
    fn test_unsorted_transcripts_rejected() {
        let reference = format!(
            "{}0\tNM_0\tchr1\t+\t10\t90\t20\t80\t1\t10,\t90,\t0\tG0\n",
            NM_PLUS
        );
        let err = run_with(&GeneStatsCommand::new(), &reference, "").unwrap_err();
        assert!(matches!(err, BedError::Unsorted { .. }));
    }

    #[test]
    fn test_peaks_need_strand() {
        let err = run_with(&GeneStatsCommand::new(), NM_PLUS, "chr1\t10\t20\n").unwrap_err();
        assert!(matches!(err, BedError::Parse { .. }));
    }

    #[test]
    fn test_region_stats_proportion() {
        let peaks = vec![ActiveInterval::new(0, 5)];
        let stats = RegionStats::score(&[Span::new(0, 10), Span::new(20, 30)], &peaks);
        assert_eq!(stats.regions, 2);
        assert_eq!(stats.covered, 1);
        assert_eq!(stats.bases, 20);
        assert_eq!(stats.proportion(), 0.25);
        assert_eq!(RegionStats::default().proportion(), 0.0);
    }
}
