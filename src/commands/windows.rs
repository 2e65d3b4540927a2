//! Exon and intron windows of a transcript table, as BED6.
//!
//! Each transcript yields one line per exon (`<name>_exon_<i>`) followed by
//! one line per intron (`<name>_intron_<i>`), numbered from 0. Stretches
//! between the transcript ends and the outermost exons count as introns.

use crate::bed::{BedError, BedReader};
use crate::gene_model::{Span, Transcript, TranscriptColumns, TranscriptReader};
use crate::streaming::TsvWriter;
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

/// Windows command configuration.
#[derive(Debug, Clone, Default)]
pub struct WindowsCommand {
    pub columns: TranscriptColumns,
}

impl WindowsCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(mut self, columns: TranscriptColumns) -> Self {
        self.columns = columns;
        self
    }

    /// Write the windows of every transcript in `reference` to `output`.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        reference: P,
        output: Q,
    ) -> Result<WindowsStats, BedError> {
        let transcripts = TranscriptReader::from_path(reference, self.columns.clone())?;
        let mut out = TsvWriter::create(output)?;
        self.run_streaming(transcripts, &mut out)
    }

    /// Windows of an in-memory table (useful for testing).
    pub fn run_str<W: Write>(
        &self,
        reference: &str,
        out: &mut TsvWriter<W>,
    ) -> Result<WindowsStats, BedError> {
        let transcripts =
            TranscriptReader::new(BedReader::new(reference.as_bytes()), self.columns.clone());
        self.run_streaming(transcripts, out)
    }

    pub fn run_streaming<R: Read, W: Write>(
        &self,
        transcripts: TranscriptReader<R>,
        out: &mut TsvWriter<W>,
    ) -> Result<WindowsStats, BedError> {
        let mut stats = WindowsStats::default();
        for transcript in transcripts {
            let transcript = transcript?;
            stats.transcripts += 1;

            let (exons, introns) = transcript.windows();
            write_windows(out, &transcript, &exons, "exon")?;
            write_windows(out, &transcript, &introns, "intron")?;
            stats.exons += exons.len();
            stats.introns += introns.len();
        }
        out.flush()?;
        Ok(stats)
    }
}

fn write_windows<W: Write>(
    out: &mut TsvWriter<W>,
    transcript: &Transcript,
    spans: &[Span],
    kind: &str,
) -> Result<(), BedError> {
    for (i, span) in spans.iter().enumerate() {
        out.write_bed3(&transcript.chrom, span.start, span.end)?;
        out.write_tab()?;
        out.write_str(&transcript.name)?;
        out.write_str("_")?;
        out.write_str(kind)?;
        out.write_str("_")?;
        out.write_int(i)?;
        out.write_str("\t0\t")?;
        out.write_str(&transcript.strand.to_string())?;
        out.write_newline()?;
    }
    Ok(())
}

/// Statistics from a windows run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WindowsStats {
    pub transcripts: usize,
    pub exons: usize,
    pub introns: usize,
}

impl fmt::Display for WindowsStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transcripts: {}, Exons: {}, Introns: {}",
            self.transcripts, self.exons, self.introns
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows(reference: &str) -> (String, WindowsStats) {
        let mut buf = Vec::new();
        let stats = {
            let mut out = TsvWriter::new(&mut buf);
            WindowsCommand::new().run_str(reference, &mut out).unwrap()
        };
        (String::from_utf8(buf).unwrap(), stats)
    }

    #[test]
    fn test_exons_then_introns() {
        let (out, stats) = windows(
            "0\tNM_1\tchr1\t-\t100\t1000\t150\t900\t2\t100,800,\t200,1000,\t0\tG\n",
        );
        assert_eq!(
            out,
            "chr1\t100\t200\tNM_1_exon_0\t0\t-\n\
             chr1\t800\t1000\tNM_1_exon_1\t0\t-\n\
             chr1\t200\t800\tNM_1_intron_0\t0\t-\n"
        );
        assert_eq!(stats.exons, 2);
        assert_eq!(stats.introns, 1);
    }

    #[test]
    fn test_flanking_introns() {
        let (out, _) = windows(
            "0\tNM_2\tchr2\t+\t50\t1100\t150\t900\t2\t100,800,\t200,1000,\t0\tG\n",
        );
        let names: Vec<&str> = out.lines().map(|l| l.split('\t').nth(3).unwrap()).collect();
        assert_eq!(
            names,
            vec!["NM_2_exon_0", "NM_2_exon_1", "NM_2_intron_0", "NM_2_intron_1", "NM_2_intron_2"]
        );
        assert!(out.contains("chr2\t50\t100\tNM_2_intron_0"));
        assert!(out.contains("chr2\t1000\t1100\tNM_2_intron_2"));
    }

    #[test]
    fn test_bad_row_is_fatal() {
        let mut buf = Vec::new();
        let mut out = TsvWriter::new(&mut buf);
        let err = WindowsCommand::new()
            .run_str("0\tNM_3\tchr1\t+\tx\t10\t0\t0\t1\t0,\t10,\t0\tG\n", &mut out)
            .unwrap_err();
        assert!(matches!(err, BedError::Parse { line: 1, .. }));
    }
}
