//! Transcript tables and their partition into exons, introns and UTRs.
//!
//! Transcripts come from gene-prediction tables in the UCSC layout
//! (refGene, knownGene, ...): one tab-separated row per transcript with
//! comma-joined exon start and end lists.

use crate::bed::{open_input, BedError, BedReader};
use crate::interval::{ContigKey, Strand};
use crate::streaming::buffers::DEFAULT_INPUT_BUFFER;
use crate::streaming::parsing::{parse_u64_fast, parse_u64_list};
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

pub use crate::streaming::ActiveInterval as Span;

/// Column indices of the fields a transcript is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptColumns {
    pub name: usize,
    /// Gene symbol; tables without one report the transcript name.
    pub name2: Option<usize>,
    pub chrom: usize,
    pub strand: usize,
    pub tx_start: usize,
    pub tx_end: usize,
    pub cds_start: usize,
    pub cds_end: usize,
    pub exon_starts: usize,
    pub exon_ends: usize,
}

impl Default for TranscriptColumns {
    fn default() -> Self {
        Self::refgene()
    }
}

impl TranscriptColumns {
    /// `bin name chrom strand txStart txEnd cdsStart cdsEnd exonCount
    /// exonStarts exonEnds score name2 ...`
    pub fn refgene() -> Self {
        Self {
            name: 1,
            name2: Some(12),
            chrom: 2,
            strand: 3,
            tx_start: 4,
            tx_end: 5,
            cds_start: 6,
            cds_end: 7,
            exon_starts: 9,
            exon_ends: 10,
        }
    }

    /// Map a tab-separated header line to column indices.
    ///
    /// Table prefixes (`hg19.knownGene.txStart`) and a leading `#` are
    /// ignored. `refseq`, `geneSymbol`, `chromStart` and `chromEnd` are
    /// accepted for `name`, `name2`, `txStart` and `txEnd`, and win when
    /// both are present (a knownGene table joined with kgXref reports the
    /// RefSeq accession, not the UCSC id).
    pub fn from_header(line: &str) -> Result<Self, BedError> {
        let mut name = None;
        let mut name2 = None;
        let mut chrom = None;
        let mut strand = None;
        let mut tx_start = None;
        let mut tx_end = None;
        let mut cds_start = None;
        let mut cds_end = None;
        let mut exon_starts = None;
        let mut exon_ends = None;

        for (idx, raw) in line.trim_end_matches(['\n', '\r']).split('\t').enumerate() {
            let column = raw.trim().trim_start_matches('#');
            let column = column.rsplit('.').next().unwrap_or(column);
            let (slot, alias) = match column {
                "name" => (&mut name, false),
                "refseq" => (&mut name, true),
                "name2" => (&mut name2, false),
                "geneSymbol" => (&mut name2, true),
                "chrom" => (&mut chrom, false),
                "strand" => (&mut strand, false),
                "txStart" => (&mut tx_start, false),
                "chromStart" => (&mut tx_start, true),
                "txEnd" => (&mut tx_end, false),
                "chromEnd" => (&mut tx_end, true),
                "cdsStart" => (&mut cds_start, false),
                "cdsEnd" => (&mut cds_end, false),
                "exonStarts" => (&mut exon_starts, false),
                "exonEnds" => (&mut exon_ends, false),
                _ => continue,
            };
            if alias {
                *slot = Some(idx);
            } else {
                slot.get_or_insert(idx);
            }
        }

        let require = |slot: Option<usize>, column: &str| {
            slot.ok_or_else(|| {
                BedError::InvalidFormat(format!("transcript header has no '{}' column", column))
            })
        };
        Ok(Self {
            name: require(name, "name")?,
            name2,
            chrom: require(chrom, "chrom")?,
            strand: require(strand, "strand")?,
            tx_start: require(tx_start, "txStart")?,
            tx_end: require(tx_end, "txEnd")?,
            cds_start: require(cds_start, "cdsStart")?,
            cds_end: require(cds_end, "cdsEnd")?,
            exon_starts: require(exon_starts, "exonStarts")?,
            exon_ends: require(exon_ends, "exonEnds")?,
        })
    }

    /// Read the header line from a one-line format file.
    pub fn from_header_file<P: AsRef<Path>>(path: P) -> Result<Self, BedError> {
        let path = path.as_ref();
        let mut line = String::new();
        BufReader::new(open_input(path)?).read_line(&mut line)?;
        if line.trim().is_empty() {
            return Err(BedError::InvalidFormat(format!(
                "{}: header file is empty",
                path.display()
            )));
        }
        Self::from_header(&line)
    }

    /// Number of columns a row must have.
    fn width(&self) -> usize {
        [
            self.name,
            self.name2.unwrap_or(0),
            self.chrom,
            self.strand,
            self.tx_start,
            self.tx_end,
            self.cds_start,
            self.cds_end,
            self.exon_starts,
            self.exon_ends,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }

    /// Parse one table row.
    pub fn parse(&self, line: &str, line_number: usize) -> Result<Transcript, BedError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < self.width() {
            return Err(BedError::Parse {
                line: line_number,
                message: format!(
                    "Expected at least {} transcript columns, got {}",
                    self.width(),
                    fields.len()
                ),
            });
        }

        let number = |idx: usize, what: &str| {
            parse_u64_fast(fields[idx].trim().as_bytes()).ok_or_else(|| BedError::Parse {
                line: line_number,
                message: format!("Invalid {}: '{}'", what, fields[idx]),
            })
        };
        let list = |idx: usize, what: &str| {
            parse_u64_list(fields[idx].trim().as_bytes()).ok_or_else(|| BedError::Parse {
                line: line_number,
                message: format!("Invalid {} list: '{}'", what, fields[idx]),
            })
        };

        let tx_start = number(self.tx_start, "txStart")?;
        let tx_end = number(self.tx_end, "txEnd")?;
        let cds_start = number(self.cds_start, "cdsStart")?;
        let cds_end = number(self.cds_end, "cdsEnd")?;
        let starts = list(self.exon_starts, "exonStarts")?;
        let ends = list(self.exon_ends, "exonEnds")?;

        if starts.len() != ends.len() {
            return Err(BedError::Parse {
                line: line_number,
                message: format!(
                    "{} exon starts but {} exon ends",
                    starts.len(),
                    ends.len()
                ),
            });
        }
        if tx_start > tx_end || cds_start > cds_end {
            return Err(BedError::Parse {
                line: line_number,
                message: format!(
                    "Inverted coordinates: tx {}-{}, cds {}-{}",
                    tx_start, tx_end, cds_start, cds_end
                ),
            });
        }
        let mut exons = Vec::with_capacity(starts.len());
        for (start, end) in starts.into_iter().zip(ends) {
            if start > end {
                return Err(BedError::Parse {
                    line: line_number,
                    message: format!("Exon start ({}) > end ({})", start, end),
                });
            }
            exons.push(Span::new(start, end));
        }

        let name = fields[self.name].to_string();
        let name2 = match self.name2 {
            Some(idx) => fields[idx].to_string(),
            None => name.clone(),
        };
        let strand = fields[self.strand]
            .chars()
            .next()
            .map(Strand::from_char)
            .unwrap_or(Strand::Unknown);

        Ok(Transcript {
            name,
            name2,
            chrom: fields[self.chrom].to_string(),
            strand,
            tx_start,
            tx_end,
            cds_start,
            cds_end,
            exons,
        })
    }
}

/// One row of a transcript table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// Transcript accession (refseq id)
    pub name: String,
    /// Gene symbol
    pub name2: String,
    pub chrom: String,
    pub strand: Strand,
    pub tx_start: u64,
    pub tx_end: u64,
    pub cds_start: u64,
    pub cds_end: u64,
    /// Exons in table order, including their UTR parts.
    pub exons: Vec<Span>,
}

impl Transcript {
    #[inline]
    pub fn is_coding(&self) -> bool {
        self.cds_start != self.cds_end
    }

    /// Transcript length.
    #[inline]
    pub fn len(&self) -> u64 {
        self.tx_end - self.tx_start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tx_start == self.tx_end
    }

    /// Transcripts are grouped by chromosome and strand.
    pub fn key(&self) -> ContigKey {
        ContigKey::new(self.chrom.clone(), Some(self.strand))
    }

    /// Split the transcript into coding exons, introns and UTRs.
    ///
    /// Coding exons are the exons clipped to `[cds_start, cds_end)`; exons
    /// with no base inside are dropped. Introns are the gaps between
    /// consecutive coding exons. The 5' UTR is `[tx_start, cds_start)` on
    /// `+` and `[cds_end, tx_end)` otherwise; the 3' UTR is the other end.
    /// Non-coding transcripts have no exons or introns.
    pub fn partition(&self) -> GeneModel {
        let low = span(self.tx_start, self.cds_start);
        let high = span(self.cds_end, self.tx_end);
        let (fp_utr, tp_utr) = match self.strand {
            Strand::Plus => (low, high),
            Strand::Minus | Strand::Unknown => (high, low),
        };

        if !self.is_coding() {
            return GeneModel {
                coding: false,
                coding_exons: Vec::new(),
                introns: Vec::new(),
                fp_utr,
                tp_utr,
            };
        }

        let coding_exons: Vec<Span> = self
            .exons
            .iter()
            .filter(|e| e.end > self.cds_start && e.start < self.cds_end)
            .map(|e| Span::new(e.start.max(self.cds_start), e.end.min(self.cds_end)))
            .collect();
        let introns = gaps(&coding_exons).collect();

        GeneModel {
            coding: true,
            coding_exons,
            introns,
            fp_utr,
            tp_utr,
        }
    }

    /// Unclipped exon windows and the intron windows between them,
    /// including the stretch before the first exon and after the last one.
    pub fn windows(&self) -> (Vec<Span>, Vec<Span>) {
        let mut introns = Vec::with_capacity(self.exons.len() + 1);
        if let (Some(first), Some(last)) = (self.exons.first(), self.exons.last()) {
            if first.start > self.tx_start {
                introns.push(Span::new(self.tx_start, first.start));
            }
            introns.extend(gaps(&self.exons));
            if last.end < self.tx_end {
                introns.push(Span::new(last.end, self.tx_end));
            }
        }
        (self.exons.clone(), introns)
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.name, self.name2, self.chrom, self.tx_start, self.tx_end, self.strand
        )
    }
}

#[inline]
fn span(start: u64, end: u64) -> Span {
    Span::new(start, end.max(start))
}

/// Non-empty gaps between consecutive spans.
fn gaps(spans: &[Span]) -> impl Iterator<Item = Span> + '_ {
    spans
        .windows(2)
        .map(|pair| Span::new(pair[0].end, pair[1].start))
        .filter(|gap| !gap.is_empty())
}

/// Sub-intervals of one transcript. Spans run low to high regardless of
/// strand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneModel {
    pub coding: bool,
    pub coding_exons: Vec<Span>,
    pub introns: Vec<Span>,
    pub fp_utr: Span,
    pub tp_utr: Span,
}

impl fmt::Display for GeneModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |spans: &[Span]| {
            spans
                .iter()
                .map(|s| format!("[{}, {})", s.start, s.end))
                .collect::<Vec<_>>()
                .join(" ")
        };
        write!(
            f,
            "5' UTR: [{}, {}) exons: {} introns: {} 3' UTR: [{}, {})",
            self.fp_utr.start,
            self.fp_utr.end,
            list(&self.coding_exons),
            list(&self.introns),
            self.tp_utr.start,
            self.tp_utr.end
        )
    }
}

/// Streaming reader over a transcript table.
pub struct TranscriptReader<R: Read> {
    reader: BedReader<R>,
    columns: TranscriptColumns,
}

impl TranscriptReader<Box<dyn Read>> {
    /// Open a table (plain or `.gz`).
    pub fn from_path<P: AsRef<Path>>(path: P, columns: TranscriptColumns) -> Result<Self, BedError> {
        Ok(Self::new(
            BedReader::with_capacity(open_input(path)?, DEFAULT_INPUT_BUFFER),
            columns,
        ))
    }
}

impl<R: Read> TranscriptReader<R> {
    pub fn new(reader: BedReader<R>, columns: TranscriptColumns) -> Self {
        Self { reader, columns }
    }

    /// Read the next transcript.
    pub fn read_transcript(&mut self) -> Result<Option<Transcript>, BedError> {
        let line = match self.reader.next_line()? {
            Some(line) => line.to_string(),
            None => return Ok(None),
        };
        self.columns
            .parse(&line, self.reader.line_number())
            .map(Some)
    }
}

impl<R: Read> Iterator for TranscriptReader<R> {
    type Item = Result<Transcript, BedError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_transcript().transpose()
    }
}
