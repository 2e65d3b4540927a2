//! Efficient output formatting for streaming operations.
//!
//! Uses itoa for integer formatting and ryu for float formatting
//! to avoid allocation in the hot path.

use crate::bed::BedError;
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Buffered tab-separated table writer.
///
/// Callers lay out a row as a sequence of `write_*` calls separated by
/// [`write_tab`](Self::write_tab) and ended with
/// [`write_newline`](Self::write_newline).
pub struct TsvWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl TsvWriter<File> {
    /// Create (or truncate) a file for writing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, BedError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            BedError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot create {}: {}", path.display(), e),
            ))
        })?;
        Ok(Self::new(file))
    }
}

impl<W: Write> TsvWriter<W> {
    /// Create a new writer with the default 2MB buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    /// Create a new writer with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    /// Write a header row from column names.
    pub fn write_header<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<(), BedError> {
        for (i, col) in columns.iter().enumerate() {
            if i > 0 {
                self.write_tab()?;
            }
            self.write_str(col.as_ref())?;
        }
        self.write_newline()
    }

    /// Write the three coordinate columns of an interval.
    #[inline]
    pub fn write_bed3(&mut self, chrom: &str, start: u64, end: u64) -> Result<(), BedError> {
        self.write_str(chrom)?;
        self.write_tab()?;
        self.write_int(start)?;
        self.write_tab()?;
        self.write_int(end)
    }

    /// Write a string cell.
    #[inline]
    pub fn write_str(&mut self, s: &str) -> Result<(), BedError> {
        self.writer.write_all(s.as_bytes()).map_err(BedError::Io)?;
        Ok(())
    }

    /// Write a tab character.
    #[inline]
    pub fn write_tab(&mut self) -> Result<(), BedError> {
        self.writer.write_all(b"\t").map_err(BedError::Io)?;
        Ok(())
    }

    /// Write a newline character.
    #[inline]
    pub fn write_newline(&mut self) -> Result<(), BedError> {
        self.writer.write_all(b"\n").map_err(BedError::Io)?;
        Ok(())
    }

    /// Write an integer using itoa.
    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<(), BedError> {
        self.writer
            .write_all(self.itoa_buf.format(n).as_bytes())
            .map_err(BedError::Io)?;
        Ok(())
    }

    /// Write a float using ryu (`0.5`, `0.0`, `NaN`).
    #[inline]
    pub fn write_float(&mut self, f: f64) -> Result<(), BedError> {
        self.writer
            .write_all(self.ryu_buf.format(f).as_bytes())
            .map_err(BedError::Io)?;
        Ok(())
    }

    /// Write `\t<bp>\t<fraction>` for one category.
    #[inline]
    pub fn write_bp_fraction(&mut self, bp: u64, fraction: f64) -> Result<(), BedError> {
        self.write_tab()?;
        self.write_int(bp)?;
        self.write_tab()?;
        self.write_float(fraction)
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<(), BedError> {
        self.writer.flush().map_err(BedError::Io)?;
        Ok(())
    }
}
